//! Content fetch seam
//!
//! Retrieves a file's content at a revision of an origin. `Ok(None)` means
//! the origin answered but the file does not exist there; errors are
//! reserved for the origin being unreachable or refusing.

use crate::config::SyncConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Origin revision identifier (commit id, ref or relative ref)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Wrap a revision string
    #[inline]
    #[must_use]
    pub fn new(revision: impl Into<String>) -> Self {
        Self(revision.into())
    }

    /// Revision string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The revision immediately before this one (`<rev>^`)
    #[must_use]
    pub fn predecessor(&self) -> Self {
        Self(format!("{}^", self.0))
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Fetches file content at a revision
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Content of `path` in `repository` at `revision`
    ///
    /// # Errors
    /// `FetchError` when the origin cannot be asked or refuses.
    async fn get_content_at(
        &self,
        repository: &str,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, FetchError>;
}

#[async_trait]
impl<F: ContentFetcher + ?Sized> ContentFetcher for Arc<F> {
    async fn get_content_at(
        &self,
        repository: &str,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, FetchError> {
        (**self).get_content_at(repository, path, revision).await
    }
}

type CacheKey = (String, String, RevisionId);

/// Read-through cache in front of another fetcher
///
/// Successful answers, including "file absent", are cached; errors are not.
pub struct CachingFetcher<F> {
    inner: F,
    cache: Cache<CacheKey, Option<String>>,
}

impl<F: ContentFetcher> CachingFetcher<F> {
    /// Wrap `inner` with a cache of `capacity` entries living `ttl`
    #[must_use]
    pub fn new(inner: F, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Wrap `inner` using the cache settings of `config`
    #[must_use]
    pub fn from_config(inner: F, config: &SyncConfig) -> Self {
        Self::new(
            inner,
            config.fetch_cache_capacity,
            Duration::from_secs(config.fetch_cache_ttl_secs),
        )
    }
}

#[async_trait]
impl<F: ContentFetcher> ContentFetcher for CachingFetcher<F> {
    async fn get_content_at(
        &self,
        repository: &str,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, FetchError> {
        let key = (repository.to_string(), path.to_string(), revision.clone());

        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!(repository, path, revision = %revision, "fetch cache hit");
            return Ok(hit);
        }

        let content = self.inner.get_content_at(repository, path, revision).await?;
        self.cache.insert(key, content.clone()).await;
        Ok(content)
    }
}

impl<F> fmt::Debug for CachingFetcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingFetcher")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
