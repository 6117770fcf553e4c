//! Classifier verdicts and the oracle response contract
//!
//! [`VerdictResponse`] is the JSON shape the oracle is asked for; its schema
//! is generated with `schemars` and embedded in the prompt. [`Verdict`] is
//! the validated result handed to the orchestrator.

use crate::error::VerdictError;
use docsync_model::{OnboardingStep, Severity};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Replacement instructions for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedUpdate {
    /// Exact title of the step to update
    pub step_title: String,
    /// Updated instructions in Markdown
    pub new_instructions: String,
    /// Why the update is needed
    #[serde(default)]
    pub reason: String,
}

/// JSON shape requested from the oracle
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    /// Severity, 1-10
    pub severity: f64,
    /// Exact titles of affected steps
    #[serde(default)]
    pub affected_step_titles: Vec<String>,
    /// Whether the change is safe to apply without review
    pub should_auto_update: bool,
    /// Brief description of what changed
    #[serde(default)]
    pub summary: String,
    /// Replacement instructions per affected step
    #[serde(default)]
    pub suggested_updates: Vec<SuggestedUpdate>,
}

impl VerdictResponse {
    /// Schema description embedded in the prompt
    #[must_use]
    pub fn schema_description() -> String {
        let schema = schemars::schema_for!(VerdictResponse);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }

    /// Validate against the step set the verdict is about
    ///
    /// Titles not present in `steps` are dropped, as are duplicates.
    ///
    /// # Errors
    /// - `VerdictError::NonFiniteSeverity` / `SeverityOutOfRange`
    #[allow(clippy::cast_possible_truncation)]
    pub fn into_verdict(self, steps: &[OnboardingStep]) -> Result<Verdict, VerdictError> {
        if !self.severity.is_finite() {
            return Err(VerdictError::NonFiniteSeverity);
        }
        let severity = Severity::new(self.severity.round() as i64)?;

        let known: HashSet<&str> = steps.iter().map(|s| s.title.as_str()).collect();

        let mut seen = HashSet::new();
        let affected_step_titles: Vec<String> = self
            .affected_step_titles
            .into_iter()
            .filter(|title| {
                let keep = known.contains(title.as_str());
                if !keep {
                    tracing::debug!(title = %title, "dropping unknown affected title");
                }
                keep && seen.insert(title.clone())
            })
            .collect();

        let mut seen = HashSet::new();
        let suggested_updates: Vec<SuggestedUpdate> = self
            .suggested_updates
            .into_iter()
            .filter(|update| {
                let keep = known.contains(update.step_title.as_str());
                if !keep {
                    tracing::debug!(title = %update.step_title, "dropping update for unknown step");
                }
                keep && seen.insert(update.step_title.clone())
            })
            .collect();

        Ok(Verdict {
            severity,
            affected_step_titles,
            should_auto_update: self.should_auto_update,
            summary: self.summary,
            suggested_updates,
        })
    }
}

/// Structured impact assessment for one (file, subscriber) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Severity, 1-10
    pub severity: Severity,
    /// Titles of affected steps, drawn from the assessed step set
    pub affected_step_titles: Vec<String>,
    /// Oracle's auto-update recommendation (not trusted on its own)
    pub should_auto_update: bool,
    /// Short description
    pub summary: String,
    /// Replacement instructions
    pub suggested_updates: Vec<SuggestedUpdate>,
}

impl Verdict {
    /// Summary used when analysis fails
    pub const ANALYSIS_FAILED: &'static str = "Failed to analyze changes - manual review required";

    /// Most conservative verdict: breaking, nothing applied
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            severity: Severity::MAX,
            affected_step_titles: Vec::new(),
            should_auto_update: false,
            summary: Self::ANALYSIS_FAILED.to_string(),
            suggested_updates: Vec::new(),
        }
    }

    /// Verdict for a subscriber with nothing to assess
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            severity: Severity::MIN,
            affected_step_titles: Vec::new(),
            should_auto_update: false,
            summary: "No onboarding steps to assess".to_string(),
            suggested_updates: Vec::new(),
        }
    }

    /// Whether suggested updates may be applied without review
    ///
    /// The oracle's flag alone is never enough; the severity gate always
    /// applies.
    #[inline]
    #[must_use]
    pub fn permits_auto_apply(&self) -> bool {
        self.should_auto_update && self.severity.permits_auto_apply()
    }
}
