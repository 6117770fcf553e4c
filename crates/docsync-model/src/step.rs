//! Onboarding steps
//!
//! Step titles double as the join key against classifier output, so they
//! must be unique within a plan. [`ensure_unique_titles`] checks that.

use crate::error::ModelError;
use crate::ids::{PlanId, StepId};
use crate::kinds::StepKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Content block of a step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContent {
    /// Free-text instructions (Markdown)
    pub instructions: String,
    /// Optional code sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Ordered shell commands
    #[serde(default)]
    pub commands: Vec<String>,
    /// Ordered verification checks
    #[serde(default, alias = "verificationSteps")]
    pub verification_checks: Vec<String>,
}

impl StepContent {
    /// Content with instructions only
    #[must_use]
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            ..Self::default()
        }
    }

    /// With code sample
    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// With commands
    #[inline]
    #[must_use]
    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    /// With verification checks
    #[inline]
    #[must_use]
    pub fn with_verification_checks(mut self, checks: Vec<String>) -> Self {
        self.verification_checks = checks;
        self
    }

    /// Copy of this block with the instructions replaced and everything
    /// else untouched
    #[must_use]
    pub fn with_instructions(&self, instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            ..self.clone()
        }
    }
}

/// A unit of onboarding guidance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingStep {
    /// Step identifier
    pub id: StepId,
    /// Owning plan
    pub plan_id: PlanId,
    /// Title, unique within the plan
    pub title: String,
    /// Position within the plan
    pub position: u32,
    /// Step kind
    pub kind: StepKind,
    /// Content block
    pub content: StepContent,
    /// Prerequisite steps
    #[serde(default)]
    pub prerequisites: Vec<StepId>,
    /// Estimated duration in minutes
    pub estimated_minutes: u32,
    /// Last content update
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OnboardingStep {
    /// Create a step
    #[must_use]
    pub fn new(
        plan_id: PlanId,
        title: impl Into<String>,
        position: u32,
        kind: StepKind,
        content: StepContent,
    ) -> Self {
        Self {
            id: StepId::new(),
            plan_id,
            title: title.into(),
            position,
            kind,
            content,
            prerequisites: Vec::new(),
            estimated_minutes: 15,
            updated_at: None,
        }
    }

    /// With prerequisites
    #[inline]
    #[must_use]
    pub fn with_prerequisites(mut self, prerequisites: Vec<StepId>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    /// With duration estimate
    #[inline]
    #[must_use]
    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }
}

/// Check that no two steps of `plan_id` share a title and that every step
/// belongs to the plan
///
/// # Errors
/// - `ModelError::ForeignStep` when a step belongs to another plan
/// - `ModelError::DuplicateStepTitle` on the first repeated title
pub fn ensure_unique_titles(plan_id: PlanId, steps: &[OnboardingStep]) -> Result<(), ModelError> {
    let mut seen = HashSet::with_capacity(steps.len());
    for step in steps {
        if step.plan_id != plan_id {
            return Err(ModelError::ForeignStep {
                step_id: step.id,
                plan_id,
            });
        }
        if !seen.insert(step.title.as_str()) {
            return Err(ModelError::DuplicateStepTitle {
                plan_id,
                title: step.title.clone(),
            });
        }
    }
    Ok(())
}

/// Find a step by exact title
#[must_use]
pub fn find_by_title<'a>(steps: &'a [OnboardingStep], title: &str) -> Option<&'a OnboardingStep> {
    steps.iter().find(|s| s.title == title)
}
