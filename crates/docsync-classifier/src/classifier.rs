//! Change classifier
//!
//! Turns a before/after snapshot of one file plus one subscriber's step set
//! into a [`Verdict`]. The classifier never fails: oracle errors and
//! malformed replies collapse into [`Verdict::conservative`], so every
//! detected change still produces a reviewable record downstream.

use crate::error::VerdictError;
use crate::oracle::ReasoningOracle;
use crate::prompt::build_request;
use crate::verdict::{Verdict, VerdictResponse};
use docsync_model::OnboardingStep;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Characters of old/new content shown to the oracle
    pub max_content_chars: usize,
    /// Characters of each step's instructions shown to the oracle
    pub max_step_preview_chars: usize,
    /// Output token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 2000,
            max_step_preview_chars: 100,
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

impl ClassifierConfig {
    /// With content limit
    #[inline]
    #[must_use]
    pub fn with_max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = max;
        self
    }

    /// With token budget
    #[inline]
    #[must_use]
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }
}

/// Decision function from content diff to impact verdict
pub struct ChangeClassifier {
    oracle: Arc<dyn ReasoningOracle>,
    config: ClassifierConfig,
}

impl ChangeClassifier {
    /// Create a classifier over an oracle
    #[must_use]
    pub fn new(oracle: Arc<dyn ReasoningOracle>, config: ClassifierConfig) -> Self {
        Self { oracle, config }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Assess the impact of one file change on one step set
    ///
    /// An empty step set short-circuits to [`Verdict::no_op`] without
    /// calling the oracle.
    pub async fn classify(
        &self,
        file_path: &str,
        old_content: &str,
        new_content: &str,
        current_steps: &[OnboardingStep],
    ) -> Verdict {
        if current_steps.is_empty() {
            tracing::debug!(file = file_path, "no steps to assess");
            return Verdict::no_op();
        }

        tracing::info!(file = file_path, steps = current_steps.len(), "analyzing change");

        let request = build_request(
            file_path,
            old_content,
            new_content,
            current_steps,
            &self.config,
        );

        let value = match self.oracle.analyze_structured(request).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(file = file_path, error = %e, "change analysis failed");
                return Verdict::conservative();
            }
        };

        match parse_verdict(value, current_steps) {
            Ok(verdict) => {
                tracing::info!(
                    file = file_path,
                    severity = verdict.severity.value(),
                    affected = verdict.affected_step_titles.len(),
                    auto_update = verdict.should_auto_update,
                    "analysis complete"
                );
                verdict
            }
            Err(e) => {
                tracing::error!(file = file_path, error = %e, "oracle reply did not fit verdict contract");
                Verdict::conservative()
            }
        }
    }
}

fn parse_verdict(
    value: serde_json::Value,
    steps: &[OnboardingStep],
) -> Result<Verdict, VerdictError> {
    let response: VerdictResponse = serde_json::from_value(value)?;
    response.into_verdict(steps)
}

impl fmt::Debug for ChangeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeClassifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
