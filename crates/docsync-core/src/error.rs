//! Error types for docsync core
//!
//! Provides error handling for:
//! - Record store failures
//! - Content fetch failures
//! - Worker pool shutdown
//! - Configuration problems
//!
//! Only two conditions stop a whole `sync_change` call: the subscriber
//! listing failing and the new content being unavailable. Everything else is
//! scoped to one subscriber.

use docsync_model::ModelError;

/// Main sync error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Subscriber listing failed; no subscriber could be resolved
    #[error("cannot list subscribers: {0}")]
    SourceListing(#[source] StoreError),

    /// Record store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// New content could not be fetched; nothing was written
    #[error("content unavailable for {file_path} at {revision}: {reason}")]
    ContentUnavailable {
        /// File that changed
        file_path: String,
        /// Revision requested
        revision: String,
        /// Why the fetch failed
        reason: String,
    },

    /// Worker pool error
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// Subscriber task panicked or was cancelled
    #[error("subscriber task failed: {0}")]
    TaskFailed(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Whether this error aborts the whole file change rather than one
    /// subscriber
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceListing(_) | Self::ContentUnavailable { .. } | Self::Config(_)
        )
    }
}

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind
        kind: &'static str,
        /// Identifier looked up
        id: String,
    },

    /// Row violates a model invariant
    #[error("invalid record: {0}")]
    Invalid(#[from] ModelError),

    /// Backend failure
    #[error("store backend failure: {0}")]
    Backend(String),

    /// Snapshot I/O failed
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Build a not-found error
    #[inline]
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Content fetch errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Origin address could not be understood
    #[error("invalid origin address: {0}")]
    InvalidAddress(String),

    /// Non-success status from the origin
    #[error("origin returned HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Transport failure
    #[error("origin request failed: {0}")]
    Transport(String),
}

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Pool was closed
    #[error("worker pool closed")]
    Closed,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file malformed
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}
