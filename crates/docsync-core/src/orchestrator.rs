//! Sync orchestrator
//!
//! Fans one documentation file change out to every subscribing plan:
//! - Resolves active sources tracking the repository
//! - Fetches the file at the revision and at its predecessor
//! - Classifies, records and, when permitted, applies updates per plan
//!
//! Subscribers are independent. A failure in one becomes a
//! [`SubscriberOutcome::Failed`] line in the report and never stops the
//! others. A change whose step updates were only partly written is not
//! marked processed, so it stays in the review queue.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::fetch::{ContentFetcher, RevisionId};
use crate::pool::{PlanLocks, PoolStats, WorkerPool};
use crate::report::{RecordedChange, SubscriberOutcome, SubscriberReport, SyncReport};
use crate::store::RecordStore;
use chrono::Utc;
use docsync_classifier::{ChangeClassifier, SuggestedUpdate};
use docsync_model::{
    content_fingerprint, find_by_title, ChangeKind, DiffMetadata, DocumentationSource,
    OnboardingStep, OriginKind, SourceChangeRecord,
};
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Old and new content of one file change, shared by all subscriber tasks
#[derive(Debug)]
struct FetchedChange {
    file_path: String,
    revision: RevisionId,
    old_content: String,
    new_content: String,
    fingerprint: String,
}

struct Inner {
    classifier: Arc<ChangeClassifier>,
    store: Arc<dyn RecordStore>,
    fetcher: Arc<dyn ContentFetcher>,
    pool: WorkerPool,
    plan_locks: PlanLocks,
    config: SyncConfig,
}

/// The sync orchestrator
///
/// Cheap to clone; clones share the pool, locks and collaborators.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        classifier: Arc<ChangeClassifier>,
        store: Arc<dyn RecordStore>,
        fetcher: Arc<dyn ContentFetcher>,
        config: SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                classifier,
                store,
                fetcher,
                pool: WorkerPool::new(config.max_concurrent_subscribers),
                plan_locks: PlanLocks::new(),
                config,
            }),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Worker pool statistics
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Process one changed file at one revision for every subscriber
    ///
    /// # Workflow
    /// 1. List active repository sources tracking `repository`
    /// 2. Fetch new content at `revision` and old content at its predecessor
    /// 3. Per subscriber: classify, record, and apply when permitted
    ///
    /// # Errors
    /// - `SyncError::SourceListing` if the subscriber listing fails
    /// - `SyncError::ContentUnavailable` if the new content cannot be
    ///   fetched; nothing is written in that case
    ///
    /// Per-subscriber failures are reported in the returned [`SyncReport`].
    pub async fn sync_change(
        &self,
        repository: &str,
        file_path: &str,
        revision: &RevisionId,
    ) -> Result<SyncReport, SyncError> {
        let span = tracing::info_span!(
            "sync_change",
            repository,
            file = file_path,
            revision = %revision
        );
        self.sync_change_inner(repository, file_path, revision)
            .instrument(span)
            .await
    }

    async fn sync_change_inner(
        &self,
        repository: &str,
        file_path: &str,
        revision: &RevisionId,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(repository, file_path, revision);

        let sources = self
            .inner
            .store
            .list_active_sources(OriginKind::Repository, repository)
            .await
            .map_err(SyncError::SourceListing)?;

        if sources.is_empty() {
            tracing::debug!("no active sources track this repository");
            return Ok(report);
        }

        let change = Arc::new(self.fetch_change(repository, file_path, revision).await?);
        tracing::info!(subscribers = sources.len(), "processing change");

        let mut tasks = JoinSet::new();
        for source in sources {
            let this = self.clone();
            let change = Arc::clone(&change);
            let span = tracing::info_span!(
                "subscriber",
                source_id = %source.id,
                plan_id = %source.plan_id
            );
            tasks.spawn(
                async move {
                    let source_id = source.id;
                    let plan_id = source.plan_id;
                    let outcome = match AssertUnwindSafe(this.process_subscriber(source, &change))
                        .catch_unwind()
                        .await
                    {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "subscriber failed");
                            SubscriberOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                        Err(_) => {
                            tracing::error!("subscriber task panicked");
                            SubscriberOutcome::Failed {
                                error: SyncError::TaskFailed("panicked".to_string()).to_string(),
                            }
                        }
                    };
                    SubscriberReport {
                        source_id,
                        plan_id,
                        outcome,
                    }
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(line) => report.subscribers.push(line),
                Err(e) => tracing::error!(error = %e, "subscriber task did not complete"),
            }
        }
        report.subscribers.sort_by_key(|s| s.source_id);

        tracing::info!(
            recorded = report.recorded().len(),
            failed = report.failures().len(),
            "change processed"
        );
        Ok(report)
    }

    /// Fetch both sides of the change
    ///
    /// The predecessor may legitimately not exist (new file, first commit),
    /// so any failure there degrades to empty old content.
    async fn fetch_change(
        &self,
        repository: &str,
        file_path: &str,
        revision: &RevisionId,
    ) -> Result<FetchedChange, SyncError> {
        let predecessor = revision.predecessor();
        let fetcher = &self.inner.fetcher;

        let (new_content, old_content) = tokio::join!(
            fetcher.get_content_at(repository, file_path, revision),
            fetcher.get_content_at(repository, file_path, &predecessor),
        );

        let unavailable = |reason: String| SyncError::ContentUnavailable {
            file_path: file_path.to_string(),
            revision: revision.to_string(),
            reason,
        };
        let new_content = match new_content {
            Ok(Some(content)) => content,
            Ok(None) => return Err(unavailable("file not found".to_string())),
            Err(e) => return Err(unavailable(e.to_string())),
        };

        let old_content = match old_content {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::debug!(revision = %predecessor, "no previous content; treating as new file");
                String::new()
            }
            Err(e) => {
                tracing::warn!(revision = %predecessor, error = %e, "previous content fetch failed");
                String::new()
            }
        };

        Ok(FetchedChange {
            file_path: file_path.to_string(),
            revision: revision.clone(),
            fingerprint: content_fingerprint(&new_content),
            old_content,
            new_content,
        })
    }

    async fn process_subscriber(
        &self,
        source: DocumentationSource,
        change: &FetchedChange,
    ) -> Result<SubscriberOutcome, SyncError> {
        let permit = self.inner.pool.acquire().await?;
        let result = self.classify_and_record(&source, change).await;
        permit.finish(matches!(&result, Ok(outcome) if !outcome.is_failure()));
        result
    }

    async fn classify_and_record(
        &self,
        source: &DocumentationSource,
        change: &FetchedChange,
    ) -> Result<SubscriberOutcome, SyncError> {
        let _plan_guard = if self.inner.config.serialize_plan_updates {
            Some(self.inner.plan_locks.lock(source.plan_id).await)
        } else {
            None
        };

        let store = &self.inner.store;
        let steps = store.list_steps(source.plan_id).await?;
        if steps.is_empty() {
            tracing::info!("plan has no steps; skipping");
            return Ok(SubscriberOutcome::SkippedNoSteps);
        }

        let verdict = self
            .inner
            .classifier
            .classify(
                &change.file_path,
                &change.old_content,
                &change.new_content,
                &steps,
            )
            .await;

        let affected_steps = verdict
            .affected_step_titles
            .iter()
            .filter_map(|title| find_by_title(&steps, title).map(|s| s.id))
            .collect();

        let record = SourceChangeRecord::new(
            source.id,
            ChangeKind::Content,
            change.old_content.clone(),
            change.new_content.clone(),
            DiffMetadata {
                file_path: change.file_path.clone(),
                revision: change.revision.to_string(),
                summary: verdict.summary.clone(),
            },
            affected_steps,
            verdict.severity,
            verdict.should_auto_update,
        );
        let auto_applied = record.auto_applied();
        let change_id = store.insert_change(record).await?;

        let now = Utc::now();
        if let Err(e) = store
            .record_source_sync(source.id, change.fingerprint.clone(), now)
            .await
        {
            tracing::warn!(error = %e, "failed to record source sync");
        }

        let mut recorded = RecordedChange {
            change_id,
            severity: verdict.severity,
            auto_applied,
            steps_updated: Vec::new(),
            steps_unchanged: 0,
            updates_skipped: 0,
            updates_failed: 0,
        };

        if !auto_applied {
            tracing::info!(
                %change_id,
                severity = verdict.severity.value(),
                "change recorded for manual review"
            );
            return Ok(SubscriberOutcome::Recorded(recorded));
        }

        self.apply_updates(&steps, &verdict.suggested_updates, &mut recorded)
            .await;

        if recorded.updates_failed > 0 {
            tracing::warn!(
                %change_id,
                failed = recorded.updates_failed,
                updated = recorded.steps_updated.len(),
                "some step updates failed; change left for review"
            );
            return Ok(SubscriberOutcome::PartiallyApplied(recorded));
        }
        store.mark_change_processed(change_id, Utc::now()).await?;

        tracing::info!(
            %change_id,
            severity = verdict.severity.value(),
            updated = recorded.steps_updated.len(),
            "change auto-applied"
        );
        Ok(SubscriberOutcome::Recorded(recorded))
    }

    /// Rewrite the instructions of each step a suggestion names
    ///
    /// Only `instructions` change; code, commands and checks are kept.
    async fn apply_updates(
        &self,
        steps: &[OnboardingStep],
        updates: &[SuggestedUpdate],
        recorded: &mut RecordedChange,
    ) {
        for update in updates {
            let Some(step) = find_by_title(steps, &update.step_title) else {
                tracing::warn!(title = %update.step_title, "suggested update names no step");
                recorded.updates_skipped += 1;
                continue;
            };

            if step.content.instructions == update.new_instructions {
                recorded.steps_unchanged += 1;
                continue;
            }

            let content = step.content.with_instructions(update.new_instructions.clone());
            match self
                .inner
                .store
                .update_step_content(step.id, content, Utc::now())
                .await
            {
                Ok(()) => {
                    tracing::debug!(step_id = %step.id, title = %step.title, "step updated");
                    recorded.steps_updated.push(step.id);
                }
                Err(e) => {
                    tracing::error!(step_id = %step.id, error = %e, "step update failed");
                    recorded.updates_failed += 1;
                }
            }
        }
    }
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("config", &self.inner.config)
            .field("classifier", &self.inner.classifier)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}
