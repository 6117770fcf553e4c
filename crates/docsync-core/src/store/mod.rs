//! Record store seam
//!
//! The orchestrator only reads subscribers and steps and writes change
//! records, step content and sync bookkeeping through [`RecordStore`].
//! Persistence technology is the implementor's concern.

mod memory;

pub use memory::{MemoryStore, StoreSnapshot};

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsync_model::{
    ChangeId, DocumentationSource, OnboardingStep, OriginKind, PlanId, SourceChangeRecord,
    SourceId, StepContent, StepId,
};

/// Persistence operations used by the sync pipeline
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Active sources tracking the given origin
    async fn list_active_sources(
        &self,
        kind: OriginKind,
        address: &str,
    ) -> Result<Vec<DocumentationSource>, StoreError>;

    /// Steps of a plan, ordered by position
    async fn list_steps(&self, plan_id: PlanId) -> Result<Vec<OnboardingStep>, StoreError>;

    /// Persist a new change record
    async fn insert_change(&self, record: SourceChangeRecord) -> Result<ChangeId, StoreError>;

    /// Set the processing timestamp of a change record
    async fn mark_change_processed(
        &self,
        change_id: ChangeId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Replace a step's content
    async fn update_step_content(
        &self,
        step_id: StepId,
        content: StepContent,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Record the fingerprint and time of a successful sync
    async fn record_source_sync(
        &self,
        source_id: SourceId,
        fingerprint: String,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
