//! Push webhook handling
//!
//! Turns a GitHub `push` delivery into one `sync_change` call per
//! documentation file per commit. Signature verification belongs to the
//! HTTP receiver in front of this module.

use crate::error::GithubError;
use docsync_classifier::is_documentation_file;
use docsync_core::{RevisionId, SyncOrchestrator, SyncReport};
use serde::{Deserialize, Serialize};

/// Event named by the `X-GitHub-Event` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Commits pushed
    Push,
    /// Webhook configured
    Ping,
    /// Anything else; acknowledged and ignored
    Other(String),
}

impl WebhookEvent {
    /// Parse the header value
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        match value.trim() {
            "push" => Self::Push,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Push event payload (fields docsync reads)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Pushed ref, e.g. `refs/heads/main`
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    /// Repository pushed to
    pub repository: PushRepository,
    /// Pushed commits, oldest first
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

/// Repository section of a push payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRepository {
    /// Browser URL; sources track this address
    pub html_url: String,
    /// `owner/name`
    #[serde(default)]
    pub full_name: String,
}

/// One commit of a push payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    /// Commit id
    pub id: String,
    /// Commit message
    #[serde(default)]
    pub message: String,
    /// Added paths
    #[serde(default)]
    pub added: Vec<String>,
    /// Modified paths
    #[serde(default)]
    pub modified: Vec<String>,
    /// Removed paths
    #[serde(default)]
    pub removed: Vec<String>,
}

/// One (file, revision) to sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSync {
    /// Revision the file changed at
    pub revision: RevisionId,
    /// Changed documentation file
    pub file_path: String,
}

/// Documentation files to sync for a push, in commit order
///
/// Removed files are skipped; a file listed twice in one commit is synced
/// once.
#[must_use]
pub fn plan_file_syncs(event: &PushEvent) -> Vec<FileSync> {
    let mut syncs = Vec::new();
    for commit in &event.commits {
        let revision = RevisionId::new(&commit.id);
        let mut seen: Vec<&str> = Vec::new();
        for path in commit.modified.iter().chain(&commit.added) {
            if !is_documentation_file(path) || commit.removed.contains(path) {
                continue;
            }
            if seen.contains(&path.as_str()) {
                continue;
            }
            seen.push(path);
            syncs.push(FileSync {
                revision: revision.clone(),
                file_path: path.clone(),
            });
        }
    }
    syncs
}

/// Outcome of a push dispatch
#[derive(Debug, Default)]
pub struct DispatchSummary {
    /// Reports of successful `sync_change` calls
    pub reports: Vec<SyncReport>,
    /// Files whose sync aborted, with the reason
    pub failed: Vec<(FileSync, String)>,
}

impl DispatchSummary {
    /// Files attempted
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.reports.len() + self.failed.len()
    }
}

/// Sync every documentation file of a push, continuing past failures
pub async fn dispatch_push(orchestrator: &SyncOrchestrator, event: &PushEvent) -> DispatchSummary {
    let repository = &event.repository.html_url;
    let syncs = plan_file_syncs(event);
    tracing::info!(
        repository = %repository,
        git_ref = %event.git_ref,
        commits = event.commits.len(),
        files = syncs.len(),
        "push received"
    );

    let mut summary = DispatchSummary::default();
    for sync in syncs {
        match orchestrator
            .sync_change(repository, &sync.file_path, &sync.revision)
            .await
        {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                tracing::error!(
                    file = %sync.file_path,
                    revision = %sync.revision,
                    error = %e,
                    "sync failed; continuing"
                );
                summary.failed.push((sync, e.to_string()));
            }
        }
    }
    summary
}

/// Response for a webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResponse {
    /// Always true once the payload parsed
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

impl DeliveryResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Handle one webhook delivery
///
/// # Errors
/// `GithubError::InvalidPayload` if a push body does not parse.
pub async fn handle_delivery(
    orchestrator: &SyncOrchestrator,
    event_header: &str,
    body: &[u8],
) -> Result<DeliveryResponse, GithubError> {
    match WebhookEvent::from_header(event_header) {
        WebhookEvent::Ping => {
            tracing::info!("webhook ping received");
            Ok(DeliveryResponse::ok("Pong! Webhook is working."))
        }
        WebhookEvent::Push => {
            let event: PushEvent = serde_json::from_slice(body)?;
            let summary = dispatch_push(orchestrator, &event).await;
            Ok(DeliveryResponse::ok(format!(
                "Webhook processed: {} files synced, {} failed",
                summary.reports.len(),
                summary.failed.len()
            )))
        }
        WebhookEvent::Other(name) => {
            tracing::debug!(event = %name, "ignoring webhook event");
            Ok(DeliveryResponse::ok(format!(
                "Event {name} received but not processed"
            )))
        }
    }
}
