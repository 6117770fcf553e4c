//! Subcommand implementations

use crate::config::AppConfig;
use anyhow::{bail, Context};
use docsync_classifier::{is_documentation_file, AnthropicOracle, ChangeClassifier, Verdict};
use docsync_core::{CachingFetcher, MemoryStore, RevisionId, SyncOrchestrator, SyncReport};
use docsync_github::GithubFetcher;
use docsync_model::{ChangeId, OnboardingStep, PlanId, StepContent, StepKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Documentation classification of each path, in input order
#[must_use]
pub fn is_doc<S: AsRef<str>>(paths: &[S]) -> Vec<(String, bool)> {
    paths
        .iter()
        .map(|p| (p.as_ref().to_string(), is_documentation_file(p.as_ref())))
        .collect()
}

/// Step entry of a `classify --steps` file
#[derive(Debug, Clone, Deserialize)]
pub struct StepInput {
    /// Step title
    pub title: String,
    /// Step instructions
    pub instructions: String,
    /// Step kind (defaults to setup)
    #[serde(default)]
    pub kind: Option<StepKind>,
}

/// Build a throwaway plan from step inputs
#[must_use]
pub fn steps_from_inputs(inputs: Vec<StepInput>) -> Vec<OnboardingStep> {
    let plan = PlanId::new();
    inputs
        .into_iter()
        .zip(0u32..)
        .map(|(input, position)| {
            OnboardingStep::new(
                plan,
                input.title,
                position,
                input.kind.unwrap_or(StepKind::Setup),
                StepContent::new(input.instructions),
            )
        })
        .collect()
}

/// Run the classifier against the configured oracle
///
/// # Errors
/// Unreadable inputs or a missing oracle key.
pub async fn classify(
    config: &AppConfig,
    file_path: &str,
    old: Option<&Path>,
    new: &Path,
    steps: &Path,
) -> anyhow::Result<Verdict> {
    let old_content = match old {
        Some(path) => read(path)?,
        None => String::new(),
    };
    let new_content = read(new)?;
    let inputs: Vec<StepInput> = serde_json::from_str(&read(steps)?)
        .with_context(|| format!("parsing steps from {}", steps.display()))?;

    let oracle = AnthropicOracle::new(config.docsync.oracle.clone())?;
    let classifier = ChangeClassifier::new(Arc::new(oracle), config.docsync.classifier.clone());

    Ok(classifier
        .classify(file_path, &old_content, &new_content, &steps_from_inputs(inputs))
        .await)
}

/// Process one file change against a store snapshot and save it back
///
/// # Errors
/// Snapshot, configuration, or fatal sync errors.
pub async fn sync(
    config: &AppConfig,
    store_path: &Path,
    repository: &str,
    file_path: &str,
    revision: &str,
) -> anyhow::Result<SyncReport> {
    let store = Arc::new(
        MemoryStore::load(store_path)
            .with_context(|| format!("loading store from {}", store_path.display()))?,
    );

    let oracle = AnthropicOracle::new(config.docsync.oracle.clone())?;
    let classifier = Arc::new(ChangeClassifier::new(
        Arc::new(oracle),
        config.docsync.classifier.clone(),
    ));
    let fetcher = CachingFetcher::from_config(
        GithubFetcher::new(config.github.clone())?,
        &config.docsync.sync,
    );
    let orchestrator = SyncOrchestrator::new(
        classifier,
        store.clone(),
        Arc::new(fetcher),
        config.docsync.sync.clone(),
    );

    let result = orchestrator
        .sync_change(repository, file_path, &RevisionId::new(revision))
        .await;

    // Subscribers that finished still wrote records; persist them either way
    store
        .save(store_path)
        .with_context(|| format!("saving store to {}", store_path.display()))?;

    Ok(result?)
}

/// Pending review line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    /// Change record id
    pub change_id: ChangeId,
    /// File that changed
    pub file_path: String,
    /// Revision it changed at
    pub revision: String,
    /// Severity 1-10
    pub severity: u8,
    /// Classifier summary
    pub summary: String,
}

/// List pending reviews in a snapshot
///
/// # Errors
/// Unreadable snapshot.
pub fn pending_reviews(store_path: &Path) -> anyhow::Result<Vec<ReviewItem>> {
    let store = MemoryStore::load(store_path)?;
    Ok(store
        .pending_reviews()
        .into_iter()
        .map(|record| ReviewItem {
            change_id: record.id,
            file_path: record.diff.file_path,
            revision: record.diff.revision,
            severity: record.severity.value(),
            summary: record.diff.summary,
        })
        .collect())
}

/// Close a review and save the snapshot
///
/// # Errors
/// Unreadable snapshot, malformed id, or unknown record.
pub fn mark_reviewed(store_path: &Path, change_id: &str) -> anyhow::Result<()> {
    let Ok(id) = change_id.parse::<ChangeId>() else {
        bail!("not a change id: {change_id}");
    };
    let store = MemoryStore::load(store_path)?;
    store.mark_reviewed(id)?;
    store.save(store_path)?;
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
