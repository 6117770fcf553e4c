//! Sync outcome reporting

use crate::fetch::RevisionId;
use docsync_model::{ChangeId, PlanId, Severity, SourceId, StepId};
use serde::Serialize;

/// What happened for one subscriber of a file change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubscriberOutcome {
    /// A change record was written
    Recorded(RecordedChange),
    /// A change record was written and auto-applied, but the store refused
    /// some step updates; the record stays in the review queue
    PartiallyApplied(RecordedChange),
    /// The plan has no steps; nothing was written
    SkippedNoSteps,
    /// Processing failed; see the error
    Failed {
        /// Error message
        error: String,
    },
}

impl SubscriberOutcome {
    /// Whether the subscriber needs attention
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PartiallyApplied(_) | Self::Failed { .. })
    }
}

/// Details of a written change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedChange {
    /// Record id
    pub change_id: ChangeId,
    /// Assessed severity
    pub severity: Severity,
    /// Whether suggested updates were applied without review
    pub auto_applied: bool,
    /// Steps whose instructions were rewritten
    pub steps_updated: Vec<StepId>,
    /// Suggested updates that matched the current instructions already
    pub steps_unchanged: usize,
    /// Suggested updates naming no step of the plan
    pub updates_skipped: usize,
    /// Suggested updates the store refused
    pub updates_failed: usize,
}

/// One subscriber's line in a [`SyncReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberReport {
    /// Subscribing source
    pub source_id: SourceId,
    /// Plan the source feeds
    pub plan_id: PlanId,
    /// Outcome
    #[serde(flatten)]
    pub outcome: SubscriberOutcome,
}

/// Result of processing one file change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Origin repository
    pub repository: String,
    /// Changed file
    pub file_path: String,
    /// Revision processed
    pub revision: RevisionId,
    /// Per-subscriber outcomes, in source id order
    pub subscribers: Vec<SubscriberReport>,
}

impl SyncReport {
    pub(crate) fn new(repository: &str, file_path: &str, revision: &RevisionId) -> Self {
        Self {
            repository: repository.to_string(),
            file_path: file_path.to_string(),
            revision: revision.clone(),
            subscribers: Vec::new(),
        }
    }

    /// No active source tracks the repository
    #[inline]
    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Change records written
    #[must_use]
    pub fn recorded(&self) -> Vec<&RecordedChange> {
        self.subscribers
            .iter()
            .filter_map(|s| match &s.outcome {
                SubscriberOutcome::Recorded(recorded)
                | SubscriberOutcome::PartiallyApplied(recorded) => Some(recorded),
                _ => None,
            })
            .collect()
    }

    /// Subscribers that failed or applied only part of their updates
    #[must_use]
    pub fn failures(&self) -> Vec<&SubscriberReport> {
        self.subscribers
            .iter()
            .filter(|s| s.outcome.is_failure())
            .collect()
    }

    /// Outcome for one source
    #[must_use]
    pub fn outcome_for(&self, source_id: SourceId) -> Option<&SubscriberOutcome> {
        self.subscribers
            .iter()
            .find(|s| s.source_id == source_id)
            .map(|s| &s.outcome)
    }
}
