//! Testing utilities for the docsync workspace
//!
//! Shared fixtures and a scripted reasoning oracle.

#![allow(missing_docs)]

use async_trait::async_trait;
use docsync_classifier::{OracleError, ReasoningOracle, StructuredRequest};
use docsync_model::{
    DocumentationSource, OnboardingStep, OrganizationId, OriginKind, PlanId, StepContent, StepKind,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TEST_REPO: &str = "https://github.com/acme/widgets";

/// A plan id and one setup step per title, in order
pub fn plan_with_steps(titles: &[&str]) -> (PlanId, Vec<OnboardingStep>) {
    let plan = PlanId::new();
    let steps = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            OnboardingStep::new(
                plan,
                *title,
                u32::try_from(i).unwrap_or(u32::MAX),
                StepKind::Setup,
                StepContent::new(format!("Instructions for {title}"))
                    .with_commands(vec![format!("echo {i}")])
                    .with_verification_checks(vec![format!("check {i}")]),
            )
        })
        .collect();
    (plan, steps)
}

/// Active repository source tracking `address` for `plan`
pub fn repository_source(plan: PlanId, address: &str) -> DocumentationSource {
    DocumentationSource::new(OrganizationId::new(), plan, OriginKind::Repository, address)
}

/// Oracle reply JSON in the verdict contract shape
pub fn verdict_json(
    severity: u8,
    affected: &[&str],
    should_auto_update: bool,
    updates: &[(&str, &str)],
) -> Value {
    json!({
        "severity": severity,
        "affectedStepTitles": affected,
        "shouldAutoUpdate": should_auto_update,
        "summary": format!("severity {severity} change"),
        "suggestedUpdates": updates
            .iter()
            .map(|(title, text)| json!({
                "stepTitle": title,
                "newInstructions": text,
                "reason": "documentation changed"
            }))
            .collect::<Vec<_>>(),
    })
}

enum Reply {
    Json(Value),
    Fail,
}

/// Oracle replaying canned replies
///
/// Rules are checked in insertion order against the rendered prompt; the
/// first rule whose marker appears wins, otherwise the default reply is used.
pub struct ScriptedOracle {
    default: Reply,
    rules: Vec<(String, Reply)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    /// Always reply with `value`
    pub fn replying(value: Value) -> Self {
        Self::with_default(Reply::Json(value))
    }

    /// Always fail
    pub fn failing() -> Self {
        Self::with_default(Reply::Fail)
    }

    fn with_default(default: Reply) -> Self {
        Self {
            default,
            rules: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `value` when the prompt mentions `marker`
    #[must_use]
    pub fn when_prompt_contains(mut self, marker: impl Into<String>, value: Value) -> Self {
        self.rules.push((marker.into(), Reply::Json(value)));
        self
    }

    /// Fail when the prompt mentions `marker`
    #[must_use]
    pub fn fail_when_prompt_contains(mut self, marker: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Reply::Fail));
        self
    }

    /// Hold every reply for `delay`
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Most requests ever in progress at once
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Rendered prompts received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn analyze_structured(&self, request: StructuredRequest) -> Result<Value, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let rendered = request.render();

        let reply = self
            .rules
            .iter()
            .find(|(marker, _)| rendered.contains(marker.as_str()))
            .map_or(&self.default, |(_, reply)| reply);

        self.prompts.lock().push(rendered);

        match reply {
            Reply::Json(value) => Ok(value.clone()),
            Reply::Fail => Err(OracleError::Unavailable("scripted failure".to_string())),
        }
    }
}
