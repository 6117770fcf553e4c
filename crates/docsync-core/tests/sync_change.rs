//! End-to-end orchestrator behavior over the in-memory store.

mod common;

use common::*;
use docsync_classifier::Verdict;
use docsync_core::{MemoryStore, SubscriberOutcome, SyncConfig, SyncError};
use docsync_model::Severity;
use docsync_test_utils::{repository_source, verdict_json, ScriptedOracle, TEST_REPO};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const INSTALL: &str = "Install dependencies";
const TESTS: &str = "Run tests";
const BOOTSTRAP: &str = "Run `npm install`, then `npm run bootstrap`";

fn low_severity_reply() -> serde_json::Value {
    verdict_json(3, &[INSTALL], true, &[(INSTALL, BOOTSTRAP)])
}

#[tokio::test]
async fn low_severity_change_is_applied() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.auto_applied());
    assert_eq!(record.severity.value(), 3);
    assert_eq!(record.affected_steps, vec![plan.step_id(INSTALL)]);
    assert_eq!(record.old_content, OLD);
    assert_eq!(record.new_content, NEW);
    assert_eq!(record.diff.file_path, README);
    assert_eq!(record.diff.revision, REV);
    assert!(record.processed_at.is_some());

    let install = store.step(plan.step_id(INSTALL)).unwrap();
    assert_eq!(install.content.instructions, BOOTSTRAP);
    assert!(install.updated_at.is_some());

    let tests = store.step(plan.step_id(TESTS)).unwrap();
    assert_eq!(tests.content.instructions, "Instructions for Run tests");
    assert!(tests.updated_at.is_none());

    match report.outcome_for(plan.source_id) {
        Some(SubscriberOutcome::Recorded(recorded)) => {
            assert!(recorded.auto_applied);
            assert_eq!(recorded.steps_updated, vec![plan.step_id(INSTALL)]);
        }
        other => panic!("expected recorded outcome, got {other:?}"),
    }
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn only_instructions_are_replaced() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let before = store.step(plan.step_id(INSTALL)).unwrap();
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let after = store.step(plan.step_id(INSTALL)).unwrap();
    assert_eq!(after.content.commands, before.content.commands);
    assert_eq!(after.content.verification_checks, before.content.verification_checks);
    assert_eq!(after.content.code, before.content.code);
    assert_eq!(after.title, before.title);
    assert_eq!(after.position, before.position);
}

#[tokio::test]
async fn high_severity_change_waits_for_review() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(
            9,
            &[INSTALL],
            true,
            &[(INSTALL, BOOTSTRAP)],
        ))),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert_eq!(records.len(), 1);
    assert!(!records[0].auto_applied());
    assert!(records[0].is_pending());

    for step in &plan.steps {
        assert_eq!(store.step(step.id).unwrap(), *step);
    }
    assert_eq!(store.pending_reviews().len(), 1);
}

#[tokio::test]
async fn threshold_severity_is_not_auto_applied() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(
            7,
            &[INSTALL],
            true,
            &[(INSTALL, BOOTSTRAP)],
        ))),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert!(!records[0].auto_applied());
    assert_eq!(
        store.step(plan.step_id(INSTALL)).unwrap().content.instructions,
        "Instructions for Install dependencies"
    );
}

#[tokio::test]
async fn low_severity_without_auto_update_flag_waits_for_review() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(
            2,
            &[INSTALL],
            false,
            &[(INSTALL, BOOTSTRAP)],
        ))),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert!(!records[0].auto_applied());
    assert!(store.step(plan.step_id(INSTALL)).unwrap().updated_at.is_none());
}

#[tokio::test]
async fn untracked_repository_is_a_no_op() {
    let store = Arc::new(MemoryStore::new());
    seed_plan(&store, &[INSTALL, TESTS]);
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync
        .sync_change("https://github.com/acme/elsewhere", README, &rev())
        .await
        .unwrap();

    assert!(report.is_untracked());
    assert_eq!(store.change_count(), 0);
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn store_failure_for_one_plan_does_not_affect_another() {
    let memory = Arc::new(MemoryStore::new());
    let failing = seed_plan(&memory, &[INSTALL, TESTS]);
    let healthy = seed_plan(&memory, &[INSTALL, TESTS]);

    let mut store = FaultyStore::over(memory.clone());
    store.fail_insert_for = Some(failing.source_id);

    let sync = orchestrator(
        Arc::new(store),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert_eq!(report.subscribers.len(), 2);
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        report.outcome_for(failing.source_id),
        Some(SubscriberOutcome::Failed { error }) if error.contains("write timeout")
    ));

    assert!(memory.changes_for_source(failing.source_id).is_empty());
    assert_eq!(
        memory.step(failing.step_id(INSTALL)).unwrap().content.instructions,
        "Instructions for Install dependencies"
    );

    let records = memory.changes_for_source(healthy.source_id);
    assert_eq!(records.len(), 1);
    assert!(records[0].auto_applied());
    assert_eq!(
        memory.step(healthy.step_id(INSTALL)).unwrap().content.instructions,
        BOOTSTRAP
    );
}

#[tokio::test]
async fn panicking_subscriber_is_reported_as_failed() {
    let memory = Arc::new(MemoryStore::new());
    let exploding = seed_plan(&memory, &[INSTALL]);
    let healthy = seed_plan(&memory, &[INSTALL]);

    let mut store = FaultyStore::over(memory.clone());
    store.panic_listing_steps_for = Some(exploding.plan_id);

    let sync = orchestrator(
        Arc::new(store),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert!(matches!(
        report.outcome_for(exploding.source_id),
        Some(SubscriberOutcome::Failed { .. })
    ));
    assert!(matches!(
        report.outcome_for(healthy.source_id),
        Some(SubscriberOutcome::Recorded(_))
    ));
    assert_eq!(memory.change_count(), 1);

    // Permit released while unwinding
    let stats = sync.pool_stats();
    assert_eq!(stats.active, 0);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn oracle_failure_records_conservative_change() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::failing()),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::MAX);
    assert!(!records[0].auto_applied());
    assert!(records[0].affected_steps.is_empty());
    assert_eq!(records[0].diff.summary, Verdict::ANALYSIS_FAILED);
    for step in &plan.steps {
        assert_eq!(store.step(step.id).unwrap(), *step);
    }
}

#[tokio::test]
async fn update_for_unknown_title_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(
            2,
            &[INSTALL],
            true,
            &[("Configure database", "Run migrations"), (INSTALL, BOOTSTRAP)],
        ))),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert_eq!(
        store.step(plan.step_id(INSTALL)).unwrap().content.instructions,
        BOOTSTRAP
    );
    assert_eq!(store.steps_for_plan(plan.plan_id).len(), 2);
    let recorded = report.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].steps_updated.len(), 1);
}

#[tokio::test]
async fn plan_without_steps_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[]);
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert_eq!(
        report.outcome_for(plan.source_id),
        Some(&SubscriberOutcome::SkippedNoSteps)
    );
    assert_eq!(store.change_count(), 0);
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn missing_new_content_aborts_without_writes() {
    let store = Arc::new(MemoryStore::new());
    seed_plan(&store, &[INSTALL]);
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(store.clone(), oracle.clone(), Arc::new(StaticFetcher::new()));

    let err = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, SyncError::ContentUnavailable { .. }));
    assert_eq!(store.change_count(), 0);
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn fetch_failure_aborts_without_writes() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::failing()),
    );

    let err = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap_err();

    assert!(matches!(err, SyncError::ContentUnavailable { reason, .. } if reason.contains("connection refused")));
    assert_eq!(store.change_count(), 0);
    assert!(store.source(plan.source_id).unwrap().last_synced_at.is_none());
}

#[tokio::test]
async fn missing_predecessor_is_treated_as_new_file() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(2, &[], false, &[]))),
        Arc::new(StaticFetcher::new().with(README, REV, NEW)),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let records = store.changes_for_source(plan.source_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].old_content, "");
    assert_eq!(records[0].new_content, NEW);
}

#[tokio::test]
async fn inactive_source_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    store.deactivate_source(plan.source_id).unwrap();
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert!(report.is_untracked());
    assert_eq!(store.change_count(), 0);
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn source_listing_failure_is_an_error() {
    let memory = Arc::new(MemoryStore::new());
    seed_plan(&memory, &[INSTALL]);
    let mut store = FaultyStore::over(memory.clone());
    store.fail_source_listing = true;

    let sync = orchestrator(
        Arc::new(store),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
    );

    let err = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap_err();
    assert!(matches!(err, SyncError::SourceListing(_)));
    assert!(err.is_fatal());
    assert_eq!(memory.change_count(), 0);
}

#[tokio::test]
async fn repeated_change_converges() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();
    let after_first = store.step(plan.step_id(INSTALL)).unwrap();

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();
    let after_second = store.step(plan.step_id(INSTALL)).unwrap();

    assert_eq!(after_second, after_first);
    assert_eq!(store.changes_for_source(plan.source_id).len(), 2);
    match report.outcome_for(plan.source_id) {
        Some(SubscriberOutcome::Recorded(recorded)) => {
            assert!(recorded.steps_updated.is_empty());
            assert_eq!(recorded.steps_unchanged, 1);
        }
        other => panic!("expected recorded outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn source_sync_bookkeeping_is_recorded() {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL]);
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(verdict_json(8, &[], false, &[]))),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let source = store.source(plan.source_id).unwrap();
    assert_eq!(
        source.last_content_hash,
        Some(docsync_model::content_fingerprint(NEW))
    );
    assert!(source.last_synced_at.is_some());
}

#[tokio::test]
async fn prompt_carries_both_sides_of_the_change() {
    let store = Arc::new(MemoryStore::new());
    seed_plan(&store, &[INSTALL, TESTS]);
    let oracle = Arc::new(ScriptedOracle::replying(verdict_json(1, &[], false, &[])));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(OLD));
    assert!(prompts[0].contains(NEW));
    assert!(prompts[0].contains(INSTALL));
}

#[tokio::test]
async fn many_subscribers_share_the_pool() {
    let store = Arc::new(MemoryStore::new());
    let plans: Vec<_> = (0..6).map(|_| seed_plan(&store, &[INSTALL])).collect();
    let sync = orchestrator_with(
        store.clone(),
        Arc::new(ScriptedOracle::replying(low_severity_reply())),
        Arc::new(StaticFetcher::readme_change()),
        SyncConfig::default().with_max_concurrent_subscribers(2),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert_eq!(report.recorded().len(), plans.len());
    for plan in &plans {
        assert_eq!(
            store.step(plan.step_id(INSTALL)).unwrap().content.instructions,
            BOOTSTRAP
        );
    }
    let stats = sync.pool_stats();
    assert_eq!(stats.dispatched, 6);
    assert_eq!(stats.completed, 6);
    assert_eq!(stats.active, 0);
}

#[tokio::test]
async fn failed_step_write_leaves_change_for_review() {
    let memory = Arc::new(MemoryStore::new());
    let plan = seed_plan(&memory, &[INSTALL, TESTS]);

    let mut store = FaultyStore::over(memory.clone());
    store.fail_update_for = Some(plan.step_id(INSTALL));
    let store = Arc::new(store);

    let reply = verdict_json(
        3,
        &[INSTALL, TESTS],
        true,
        &[(INSTALL, BOOTSTRAP), (TESTS, "npm run test:all")],
    );
    let sync = orchestrator(
        store.clone(),
        Arc::new(ScriptedOracle::replying(reply)),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    match report.outcome_for(plan.source_id) {
        Some(SubscriberOutcome::PartiallyApplied(recorded)) => {
            assert!(recorded.auto_applied);
            assert_eq!(recorded.steps_updated, vec![plan.step_id(TESTS)]);
            assert_eq!(recorded.updates_failed, 1);
        }
        other => panic!("expected partially applied outcome, got {other:?}"),
    }
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.recorded().len(), 1);

    let record = memory.changes_for_source(plan.source_id).remove(0);
    assert!(record.auto_applied());
    assert!(record.processed_at.is_none());
    assert_eq!(memory.pending_reviews().len(), 1);

    assert_eq!(
        memory.step(plan.step_id(INSTALL)).unwrap().content.instructions,
        "Instructions for Install dependencies"
    );
    assert_eq!(
        memory.step(plan.step_id(TESTS)).unwrap().content.instructions,
        "npm run test:all"
    );
    assert_eq!(store.step_write_count(), 1);
    assert_eq!(sync.pool_stats().failed, 1);
}

#[tokio::test]
async fn plan_tracked_by_two_sources_is_written_once() {
    let memory = Arc::new(MemoryStore::new());
    let plan = seed_plan(&memory, &[INSTALL, TESTS]);
    let second_source = memory.add_source(repository_source(plan.plan_id, TEST_REPO));

    let store = Arc::new(FaultyStore::over(memory.clone()));
    let oracle = Arc::new(ScriptedOracle::replying(low_severity_reply()));
    let sync = orchestrator(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
    );

    let report = sync.sync_change(TEST_REPO, README, &rev()).await.unwrap();

    assert_eq!(report.subscribers.len(), 2);
    assert!(report.failures().is_empty());
    assert_eq!(memory.changes_for_source(plan.source_id).len(), 1);
    assert_eq!(memory.changes_for_source(second_source).len(), 1);
    assert_eq!(oracle.call_count(), 2);

    // The second subscriber sees the first one's write under the plan lock
    assert_eq!(store.step_write_count(), 1);
    let recorded = report.recorded();
    let updated: usize = recorded.iter().map(|r| r.steps_updated.len()).sum();
    let unchanged: usize = recorded.iter().map(|r| r.steps_unchanged).sum();
    assert_eq!((updated, unchanged), (1, 1));
    assert_eq!(
        memory.step(plan.step_id(INSTALL)).unwrap().content.instructions,
        BOOTSTRAP
    );
}

async fn overlapping_syncs_on_one_plan(serialize: bool) -> usize {
    let store = Arc::new(MemoryStore::new());
    let plan = seed_plan(&store, &[INSTALL, TESTS]);
    let oracle = Arc::new(
        ScriptedOracle::replying(low_severity_reply()).with_delay(Duration::from_millis(50)),
    );
    let sync = orchestrator_with(
        store.clone(),
        oracle.clone(),
        Arc::new(StaticFetcher::readme_change()),
        SyncConfig::default().with_serialize_plan_updates(serialize),
    );

    let (rev_a, rev_b) = (rev(), rev());
    let (first, second) = tokio::join!(
        sync.sync_change(TEST_REPO, README, &rev_a),
        sync.sync_change(TEST_REPO, README, &rev_b),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(store.changes_for_source(plan.source_id).len(), 2);
    assert_eq!(oracle.call_count(), 2);
    oracle.max_concurrent_calls()
}

#[tokio::test]
async fn concurrent_syncs_on_one_plan_are_serialized() {
    assert_eq!(overlapping_syncs_on_one_plan(true).await, 1);
}

#[tokio::test]
async fn concurrent_syncs_overlap_without_plan_serialization() {
    assert_eq!(overlapping_syncs_on_one_plan(false).await, 2);
}
