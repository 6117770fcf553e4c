//! Error types for the data model
//!
//! Raised at the record-store boundary when a row carries a value the closed
//! model types cannot represent.

use crate::ids::{ChangeId, PlanId, StepId};

/// Model validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Severity outside 1..=10
    #[error("severity {0} outside 1..=10")]
    SeverityOutOfRange(i64),

    /// Unrecognised enumerated tag
    #[error("unknown {kind} tag: {value:?}")]
    UnknownTag {
        /// Which enumeration was being parsed
        kind: &'static str,
        /// The rejected value
        value: String,
    },

    /// Two steps in one plan share a title
    #[error("duplicate step title {title:?} in plan {plan_id}")]
    DuplicateStepTitle {
        /// Plan holding both steps
        plan_id: PlanId,
        /// The repeated title
        title: String,
    },

    /// Stored record claims auto-application at or above the threshold
    #[error("change {change_id} marked auto-applied at severity {severity}")]
    AutoAppliedAboveThreshold {
        /// Offending record
        change_id: ChangeId,
        /// Its severity
        severity: u8,
    },

    /// Step belongs to another plan
    #[error("step {step_id} does not belong to plan {plan_id}")]
    ForeignStep {
        /// Offending step
        step_id: StepId,
        /// Expected plan
        plan_id: PlanId,
    },
}

impl ModelError {
    /// Build an unknown-tag error
    #[inline]
    pub(crate) fn unknown_tag(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownTag {
            kind,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::SeverityOutOfRange(11);
        assert!(err.to_string().contains("outside 1..=10"));

        let err = ModelError::unknown_tag("origin kind", "gitlab");
        assert_eq!(err.to_string(), "unknown origin kind tag: \"gitlab\"");
    }
}
