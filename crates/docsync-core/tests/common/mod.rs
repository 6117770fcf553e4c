//! Shared fixtures for orchestrator tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsync_classifier::{ChangeClassifier, ClassifierConfig};
use docsync_core::{
    ContentFetcher, FetchError, MemoryStore, RecordStore, RevisionId, StoreError, SyncConfig,
    SyncOrchestrator,
};
use docsync_model::{
    ChangeId, DocumentationSource, OnboardingStep, OriginKind, PlanId, SourceChangeRecord,
    SourceId, StepContent, StepId,
};
use docsync_test_utils::{plan_with_steps, repository_source, ScriptedOracle, TEST_REPO};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const README: &str = "README.md";
pub const REV: &str = "abc123";
pub const OLD: &str = "Run `npm install`";
pub const NEW: &str = "Run `npm install` then `npm run bootstrap`";

/// Fetcher serving fixed (path, revision) contents
#[derive(Default)]
pub struct StaticFetcher {
    files: HashMap<(String, String), String>,
    failing: bool,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// README.md with `OLD` at `REV^` and `NEW` at `REV`
    pub fn readme_change() -> Self {
        Self::new()
            .with(README, &format!("{REV}^"), OLD)
            .with(README, REV, NEW)
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, path: &str, revision: &str, content: &str) -> Self {
        self.files
            .insert((path.to_string(), revision.to_string()), content.to_string());
        self
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn get_content_at(
        &self,
        _repository: &str,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, FetchError> {
        if self.failing {
            return Err(FetchError::Transport("connection refused".to_string()));
        }
        Ok(self
            .files
            .get(&(path.to_string(), revision.as_str().to_string()))
            .cloned())
    }
}

/// Store wrapper injecting faults around a [`MemoryStore`]
pub struct FaultyStore {
    pub inner: Arc<MemoryStore>,
    pub fail_insert_for: Option<SourceId>,
    pub panic_listing_steps_for: Option<PlanId>,
    pub fail_source_listing: bool,
    pub fail_update_for: Option<StepId>,
    pub step_writes: AtomicUsize,
}

impl FaultyStore {
    pub fn over(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_insert_for: None,
            panic_listing_steps_for: None,
            fail_source_listing: false,
            fail_update_for: None,
            step_writes: AtomicUsize::new(0),
        }
    }

    /// Successful step content writes so far
    pub fn step_write_count(&self) -> usize {
        self.step_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn list_active_sources(
        &self,
        kind: OriginKind,
        address: &str,
    ) -> Result<Vec<DocumentationSource>, StoreError> {
        if self.fail_source_listing {
            return Err(StoreError::Backend("database unavailable".to_string()));
        }
        self.inner.list_active_sources(kind, address).await
    }

    async fn list_steps(&self, plan_id: PlanId) -> Result<Vec<OnboardingStep>, StoreError> {
        if self.panic_listing_steps_for == Some(plan_id) {
            panic!("step listing exploded");
        }
        self.inner.list_steps(plan_id).await
    }

    async fn insert_change(&self, record: SourceChangeRecord) -> Result<ChangeId, StoreError> {
        if self.fail_insert_for == Some(record.source_id) {
            return Err(StoreError::Backend("write timeout".to_string()));
        }
        self.inner.insert_change(record).await
    }

    async fn mark_change_processed(
        &self,
        change_id: ChangeId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.mark_change_processed(change_id, at).await
    }

    async fn update_step_content(
        &self,
        step_id: StepId,
        content: StepContent,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_update_for == Some(step_id) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.step_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_step_content(step_id, content, at).await
    }

    async fn record_source_sync(
        &self,
        source_id: SourceId,
        fingerprint: String,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.record_source_sync(source_id, fingerprint, at).await
    }
}

/// A plan with steps and one active source tracking `TEST_REPO`
pub struct SeededPlan {
    pub plan_id: PlanId,
    pub source_id: SourceId,
    pub steps: Vec<OnboardingStep>,
}

impl SeededPlan {
    pub fn step_id(&self, title: &str) -> StepId {
        self.steps
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.id)
            .expect("seeded step")
    }
}

pub fn seed_plan(store: &MemoryStore, titles: &[&str]) -> SeededPlan {
    let (plan_id, steps) = plan_with_steps(titles);
    for step in &steps {
        store.add_step(step.clone()).expect("unique titles");
    }
    let source_id = store.add_source(repository_source(plan_id, TEST_REPO));
    SeededPlan {
        plan_id,
        source_id,
        steps,
    }
}

pub fn orchestrator(
    store: Arc<dyn RecordStore>,
    oracle: Arc<ScriptedOracle>,
    fetcher: Arc<dyn ContentFetcher>,
) -> SyncOrchestrator {
    orchestrator_with(store, oracle, fetcher, SyncConfig::default())
}

pub fn orchestrator_with(
    store: Arc<dyn RecordStore>,
    oracle: Arc<ScriptedOracle>,
    fetcher: Arc<dyn ContentFetcher>,
    config: SyncConfig,
) -> SyncOrchestrator {
    let classifier = Arc::new(ChangeClassifier::new(oracle, ClassifierConfig::default()));
    SyncOrchestrator::new(classifier, store, fetcher, config)
}

pub fn rev() -> RevisionId {
    RevisionId::new(REV)
}
