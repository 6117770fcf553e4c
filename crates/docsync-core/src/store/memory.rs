//! In-memory record store with JSON snapshots

use super::RecordStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use docsync_model::{
    ensure_unique_titles, ChangeId, DocumentationSource, ModelError, OnboardingStep, OriginKind,
    PlanId, SourceChangeRecord, SourceId, StepContent, StepId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Serializable copy of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// Documentation sources
    pub sources: Vec<DocumentationSource>,
    /// Onboarding steps of every plan
    pub steps: Vec<OnboardingStep>,
    /// Change records
    pub changes: Vec<SourceChangeRecord>,
}

/// Concurrent in-memory store
///
/// Deleting a source removes its change records with it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: DashMap<SourceId, DocumentationSource>,
    steps: DashMap<StepId, OnboardingStep>,
    changes: DashMap<ChangeId, SourceChangeRecord>,
    /// Serializes step inserts so title uniqueness is checked atomically
    step_writes: Mutex<()>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source
    pub fn add_source(&self, source: DocumentationSource) -> SourceId {
        let id = source.id;
        self.sources.insert(id, source);
        id
    }

    /// Get a source
    #[must_use]
    pub fn source(&self, id: SourceId) -> Option<DocumentationSource> {
        self.sources.get(&id).map(|s| s.clone())
    }

    /// Stop a source from taking part in sync
    ///
    /// # Errors
    /// `StoreError::NotFound` if the source does not exist.
    pub fn deactivate_source(&self, id: SourceId) -> Result<(), StoreError> {
        let mut source = self
            .sources
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("source", id))?;
        source.active = false;
        Ok(())
    }

    /// Remove a source and every change record detected through it
    ///
    /// # Errors
    /// `StoreError::NotFound` if the source does not exist.
    pub fn delete_source(&self, id: SourceId) -> Result<DocumentationSource, StoreError> {
        let (_, source) = self
            .sources
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("source", id))?;
        self.changes.retain(|_, record| record.source_id != id);
        Ok(source)
    }

    /// Add a step to its plan
    ///
    /// # Errors
    /// `StoreError::Invalid` if the plan already has a step with this title.
    pub fn add_step(&self, step: OnboardingStep) -> Result<StepId, StoreError> {
        let _guard = self.step_writes.lock();

        let duplicate = self
            .steps
            .iter()
            .any(|s| s.plan_id == step.plan_id && s.title == step.title);
        if duplicate {
            return Err(ModelError::DuplicateStepTitle {
                plan_id: step.plan_id,
                title: step.title,
            }
            .into());
        }

        let id = step.id;
        self.steps.insert(id, step);
        Ok(id)
    }

    /// Get a step
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<OnboardingStep> {
        self.steps.get(&id).map(|s| s.clone())
    }

    /// Steps of a plan, ordered by position
    #[must_use]
    pub fn steps_for_plan(&self, plan_id: PlanId) -> Vec<OnboardingStep> {
        let mut steps: Vec<_> = self
            .steps
            .iter()
            .filter(|s| s.plan_id == plan_id)
            .map(|s| s.clone())
            .collect();
        steps.sort_by_key(|s| (s.position, s.id));
        steps
    }

    /// Get a change record
    #[must_use]
    pub fn change(&self, id: ChangeId) -> Option<SourceChangeRecord> {
        self.changes.get(&id).map(|c| c.clone())
    }

    /// Change records of a source, oldest first
    #[must_use]
    pub fn changes_for_source(&self, source_id: SourceId) -> Vec<SourceChangeRecord> {
        let mut records: Vec<_> = self
            .changes
            .iter()
            .filter(|c| c.source_id == source_id)
            .map(|c| c.clone())
            .collect();
        records.sort_by_key(|c| c.id);
        records
    }

    /// Records awaiting human review, oldest first
    #[must_use]
    pub fn pending_reviews(&self) -> Vec<SourceChangeRecord> {
        let mut records: Vec<_> = self
            .changes
            .iter()
            .filter(|c| c.is_pending())
            .map(|c| c.clone())
            .collect();
        records.sort_by_key(|c| c.id);
        records
    }

    /// Close a review
    ///
    /// # Errors
    /// `StoreError::NotFound` if the record does not exist.
    pub fn mark_reviewed(&self, id: ChangeId) -> Result<(), StoreError> {
        let mut record = self
            .changes
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("change", id))?;
        record.mark_processed(Utc::now());
        Ok(())
    }

    /// Number of change records
    #[inline]
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Copy the store contents
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut sources: Vec<_> = self.sources.iter().map(|s| s.clone()).collect();
        sources.sort_by_key(|s| s.id);
        let mut steps: Vec<_> = self.steps.iter().map(|s| s.clone()).collect();
        steps.sort_by_key(|s| (s.plan_id, s.position, s.id));
        let mut changes: Vec<_> = self.changes.iter().map(|c| c.clone()).collect();
        changes.sort_by_key(|c| c.id);

        StoreSnapshot {
            sources,
            steps,
            changes,
        }
    }

    /// Rebuild a store from a snapshot
    ///
    /// # Errors
    /// `StoreError::Invalid` if any plan repeats a step title.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut by_plan: HashMap<PlanId, Vec<OnboardingStep>> = HashMap::new();
        for step in snapshot.steps {
            by_plan.entry(step.plan_id).or_default().push(step);
        }
        for (plan_id, steps) in &by_plan {
            ensure_unique_titles(*plan_id, steps)?;
        }

        let store = Self::new();
        for source in snapshot.sources {
            store.sources.insert(source.id, source);
        }
        for step in by_plan.into_values().flatten() {
            store.steps.insert(step.id, step);
        }
        for change in snapshot.changes {
            store.changes.insert(change.id, change);
        }
        Ok(store)
    }

    /// Load a JSON snapshot file
    ///
    /// # Errors
    /// I/O, serialization or invariant failures.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            sources = snapshot.sources.len(),
            steps = snapshot.steps.len(),
            changes = snapshot.changes.len(),
            "store snapshot loaded"
        );
        Self::from_snapshot(snapshot)
    }

    /// Write a JSON snapshot file
    ///
    /// # Errors
    /// I/O or serialization failures.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_active_sources(
        &self,
        kind: OriginKind,
        address: &str,
    ) -> Result<Vec<DocumentationSource>, StoreError> {
        let mut sources: Vec<_> = self
            .sources
            .iter()
            .filter(|s| s.is_sync_eligible() && s.tracks(kind, address))
            .map(|s| s.clone())
            .collect();
        sources.sort_by_key(|s| s.id);
        Ok(sources)
    }

    async fn list_steps(&self, plan_id: PlanId) -> Result<Vec<OnboardingStep>, StoreError> {
        Ok(self.steps_for_plan(plan_id))
    }

    async fn insert_change(&self, record: SourceChangeRecord) -> Result<ChangeId, StoreError> {
        if !self.sources.contains_key(&record.source_id) {
            return Err(StoreError::not_found("source", record.source_id));
        }
        let id = record.id;
        self.changes.insert(id, record);
        Ok(id)
    }

    async fn mark_change_processed(
        &self,
        change_id: ChangeId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut record = self
            .changes
            .get_mut(&change_id)
            .ok_or_else(|| StoreError::not_found("change", change_id))?;
        record.mark_processed(at);
        Ok(())
    }

    async fn update_step_content(
        &self,
        step_id: StepId,
        content: StepContent,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut step = self
            .steps
            .get_mut(&step_id)
            .ok_or_else(|| StoreError::not_found("step", step_id))?;
        step.content = content;
        step.updated_at = Some(at);
        Ok(())
    }

    async fn record_source_sync(
        &self,
        source_id: SourceId,
        fingerprint: String,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut source = self
            .sources
            .get_mut(&source_id)
            .ok_or_else(|| StoreError::not_found("source", source_id))?;
        source.record_sync(fingerprint, at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_model::{ChangeKind, DiffMetadata, OrganizationId, Severity, StepKind};
    use pretty_assertions::assert_eq;

    const REPO: &str = "https://github.com/acme/widgets";

    fn source(plan: PlanId) -> DocumentationSource {
        DocumentationSource::new(OrganizationId::new(), plan, OriginKind::Repository, REPO)
    }

    fn step(plan: PlanId, title: &str, position: u32) -> OnboardingStep {
        OnboardingStep::new(plan, title, position, StepKind::Setup, StepContent::new(title))
    }

    fn record(source_id: SourceId, severity: u8) -> SourceChangeRecord {
        SourceChangeRecord::new(
            source_id,
            ChangeKind::Content,
            "old",
            "new",
            DiffMetadata {
                file_path: "README.md".to_string(),
                revision: "abc".to_string(),
                summary: "changed".to_string(),
            },
            Vec::new(),
            Severity::new(i64::from(severity)).unwrap(),
            false,
        )
    }

    #[tokio::test]
    async fn active_sources_filtered_by_origin() {
        let store = MemoryStore::new();
        let plan = PlanId::new();
        let tracked = store.add_source(source(plan));
        let inactive = store.add_source(source(plan));
        store.deactivate_source(inactive).unwrap();
        store.add_source(DocumentationSource::new(
            OrganizationId::new(),
            plan,
            OriginKind::Repository,
            "https://github.com/acme/other",
        ));

        let found = store
            .list_active_sources(OriginKind::Repository, REPO)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tracked);

        let wiki = store.list_active_sources(OriginKind::Wiki, REPO).await.unwrap();
        assert!(wiki.is_empty());
    }

    #[tokio::test]
    async fn steps_listed_in_position_order() {
        let store = MemoryStore::new();
        let plan = PlanId::new();
        store.add_step(step(plan, "second", 1)).unwrap();
        store.add_step(step(plan, "first", 0)).unwrap();
        store.add_step(step(PlanId::new(), "elsewhere", 0)).unwrap();

        let titles: Vec<_> = store
            .list_steps(plan)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn duplicate_title_rejected() {
        let store = MemoryStore::new();
        let plan = PlanId::new();
        store.add_step(step(plan, "Install", 0)).unwrap();

        let err = store.add_step(step(plan, "Install", 1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid(ModelError::DuplicateStepTitle { .. })
        ));

        // Same title in another plan is fine
        store.add_step(step(PlanId::new(), "Install", 0)).unwrap();
    }

    #[tokio::test]
    async fn update_step_content_sets_timestamp() {
        let store = MemoryStore::new();
        let plan = PlanId::new();
        let id = store.add_step(step(plan, "Install", 0)).unwrap();
        let at = Utc::now();

        store
            .update_step_content(id, StepContent::new("npm ci"), at)
            .await
            .unwrap();

        let updated = store.step(id).unwrap();
        assert_eq!(updated.content.instructions, "npm ci");
        assert_eq!(updated.updated_at, Some(at));

        let missing = store
            .update_step_content(StepId::new(), StepContent::new("x"), at)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { kind: "step", .. })));
    }

    #[tokio::test]
    async fn change_requires_known_source() {
        let store = MemoryStore::new();
        let err = store.insert_change(record(SourceId::new(), 3)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "source", .. }));
    }

    #[tokio::test]
    async fn review_queue_and_mark_reviewed() {
        let store = MemoryStore::new();
        let source_id = store.add_source(source(PlanId::new()));
        let first = store.insert_change(record(source_id, 8)).await.unwrap();
        let second = store.insert_change(record(source_id, 9)).await.unwrap();

        assert_eq!(store.pending_reviews().len(), 2);

        store.mark_reviewed(first).unwrap();
        let pending = store.pending_reviews();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);
    }

    #[tokio::test]
    async fn mark_processed_keeps_first_timestamp() {
        let store = MemoryStore::new();
        let source_id = store.add_source(source(PlanId::new()));
        let id = store.insert_change(record(source_id, 2)).await.unwrap();

        let first = Utc::now();
        store.mark_change_processed(id, first).await.unwrap();
        store
            .mark_change_processed(id, first + chrono::Duration::seconds(5))
            .await
            .unwrap();

        assert_eq!(store.change(id).unwrap().processed_at, Some(first));
    }

    #[tokio::test]
    async fn delete_source_cascades_to_changes() {
        let store = MemoryStore::new();
        let keep = store.add_source(source(PlanId::new()));
        let removed = store.add_source(source(PlanId::new()));
        store.insert_change(record(keep, 2)).await.unwrap();
        store.insert_change(record(removed, 2)).await.unwrap();

        store.delete_source(removed).unwrap();

        assert_eq!(store.change_count(), 1);
        assert!(store.changes_for_source(removed).is_empty());
        assert!(store.source(removed).is_none());
        assert!(matches!(
            store.delete_source(removed),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn record_source_sync_updates_fingerprint() {
        let store = MemoryStore::new();
        let id = store.add_source(source(PlanId::new()));
        let at = Utc::now();

        store
            .record_source_sync(id, "deadbeef".to_string(), at)
            .await
            .unwrap();

        let source = store.source(id).unwrap();
        assert_eq!(source.last_content_hash.as_deref(), Some("deadbeef"));
        assert_eq!(source.last_synced_at, Some(at));
    }

    #[tokio::test]
    async fn snapshot_file_round_trip() {
        let store = MemoryStore::new();
        let plan = PlanId::new();
        let source_id = store.add_source(source(plan));
        store.add_step(step(plan, "Install", 0)).unwrap();
        store.insert_change(record(source_id, 5)).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[test]
    fn snapshot_with_duplicate_titles_rejected() {
        let plan = PlanId::new();
        let snapshot = StoreSnapshot {
            steps: vec![step(plan, "Install", 0), step(plan, "Install", 1)],
            ..StoreSnapshot::default()
        };

        assert!(matches!(
            MemoryStore::from_snapshot(snapshot),
            Err(StoreError::Invalid(_))
        ));
    }
}
