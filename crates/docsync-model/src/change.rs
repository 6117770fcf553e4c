//! Source change records
//!
//! An audit entry for one detected change applied against one subscriber.
//! Records are written once; the only later mutation is the processing
//! timestamp.

use crate::error::ModelError;
use crate::ids::{ChangeId, SourceId, StepId};
use crate::kinds::ChangeKind;
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the change came from and what it amounts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffMetadata {
    /// Path of the changed file in the origin
    pub file_path: String,
    /// Origin revision the change was observed at
    pub revision: String,
    /// Human-readable summary
    pub summary: String,
}

/// Audit record for one (source, change) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct SourceChangeRecord {
    /// Record identifier
    pub id: ChangeId,
    /// Source the change was detected through
    pub source_id: SourceId,
    /// Detection time
    pub detected_at: DateTime<Utc>,
    /// Kind of change
    pub change_kind: ChangeKind,
    /// Content before the change
    pub old_content: String,
    /// Content after the change
    pub new_content: String,
    /// Structured diff metadata
    pub diff: DiffMetadata,
    /// Steps judged affected
    pub affected_steps: Vec<StepId>,
    /// Severity
    pub severity: Severity,
    /// Whether suggested updates were applied without review
    auto_applied: bool,
    /// Set once updates are applied or the record is reviewed
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
}

impl SourceChangeRecord {
    /// Create an unprocessed record
    ///
    /// `auto_applied` is derived from `should_auto_update` and the severity
    /// gate, so a record can never claim auto-application at or above the
    /// threshold.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_id: SourceId,
        change_kind: ChangeKind,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
        diff: DiffMetadata,
        affected_steps: Vec<StepId>,
        severity: Severity,
        should_auto_update: bool,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            source_id,
            detected_at: Utc::now(),
            change_kind,
            old_content: old_content.into(),
            new_content: new_content.into(),
            diff,
            affected_steps,
            severity,
            auto_applied: should_auto_update && severity.permits_auto_apply(),
            processed_at: None,
        }
    }

    /// Whether updates were applied without review
    #[inline]
    #[must_use]
    pub fn auto_applied(&self) -> bool {
        self.auto_applied
    }

    /// Whether the record still awaits processing or review
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }

    /// Set the processing timestamp; later calls keep the first value
    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        if self.processed_at.is_none() {
            self.processed_at = Some(at);
        }
    }
}

/// Row shape as read from a store, before the auto-apply invariant is checked
#[derive(Deserialize)]
struct StoredRecord {
    id: ChangeId,
    source_id: SourceId,
    detected_at: DateTime<Utc>,
    change_kind: ChangeKind,
    old_content: String,
    new_content: String,
    diff: DiffMetadata,
    affected_steps: Vec<StepId>,
    severity: Severity,
    auto_applied: bool,
    #[serde(default)]
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoredRecord> for SourceChangeRecord {
    type Error = ModelError;

    fn try_from(row: StoredRecord) -> Result<Self, Self::Error> {
        if row.auto_applied && !row.severity.permits_auto_apply() {
            return Err(ModelError::AutoAppliedAboveThreshold {
                change_id: row.id,
                severity: row.severity.value(),
            });
        }
        Ok(Self {
            id: row.id,
            source_id: row.source_id,
            detected_at: row.detected_at,
            change_kind: row.change_kind,
            old_content: row.old_content,
            new_content: row.new_content,
            diff: row.diff,
            affected_steps: row.affected_steps,
            severity: row.severity,
            auto_applied: row.auto_applied,
            processed_at: row.processed_at,
        })
    }
}
