//! docsync core
//!
//! The sync orchestrator and the seams it drives:
//! - Record store ([`RecordStore`], [`MemoryStore`])
//! - Content fetching ([`ContentFetcher`], [`CachingFetcher`])
//! - Bounded concurrency and per-plan serialization ([`WorkerPool`], [`PlanLocks`])
//! - Configuration ([`DocsyncConfig`])
//!
//! # Example
//!
//! ```rust,ignore
//! use docsync_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(classifier: Arc<ChangeClassifier>, fetcher: Arc<dyn ContentFetcher>) -> Result<(), SyncError> {
//! let store = Arc::new(MemoryStore::new());
//! let orchestrator = SyncOrchestrator::new(classifier, store, fetcher, SyncConfig::default());
//!
//! let report = orchestrator
//!     .sync_change("https://github.com/acme/widgets", "README.md", &RevisionId::new("abc123"))
//!     .await?;
//! println!("{} records written", report.recorded().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod pool;
pub mod report;
pub mod store;

pub use config::{load_toml, DocsyncConfig, SyncConfig};
pub use error::{ConfigError, FetchError, PoolError, StoreError, SyncError};
pub use fetch::{CachingFetcher, ContentFetcher, RevisionId};
pub use orchestrator::SyncOrchestrator;
pub use pool::{PlanGuard, PlanLocks, PoolStats, WorkerPermit, WorkerPool};
pub use report::{RecordedChange, SubscriberOutcome, SubscriberReport, SyncReport};
pub use store::{MemoryStore, RecordStore, StoreSnapshot};

/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        CachingFetcher, ContentFetcher, DocsyncConfig, MemoryStore, RecordStore, RevisionId,
        SubscriberOutcome, SyncConfig, SyncError, SyncOrchestrator, SyncReport,
    };
    pub use docsync_classifier::{ChangeClassifier, ClassifierConfig, ReasoningOracle, Verdict};
    pub use docsync_model::{
        DocumentationSource, OnboardingStep, OriginKind, PlanId, Severity, SourceChangeRecord,
        StepContent, StepKind,
    };
}
