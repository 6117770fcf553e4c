//! Contents API fetcher

use crate::address::RepositoryAddress;
use crate::error::GithubError;
use async_trait::async_trait;
use docsync_core::{ContentFetcher, FetchError, RevisionId};
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no token is configured
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// GitHub API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base URL
    pub api_base_url: String,
    /// Access token; falls back to `GITHUB_TOKEN`, anonymous when neither is set
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// `User-Agent` header value (required by the API)
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: concat!("docsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GithubConfig {
    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With access token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Fetches raw file content through the repository contents API
#[derive(Debug, Clone)]
pub struct GithubFetcher {
    client: Client,
    api_base: Url,
    token: Option<String>,
}

impl GithubFetcher {
    /// Create a fetcher
    ///
    /// # Errors
    /// - `GithubError::InvalidAddress` if the API base URL does not parse
    /// - `GithubError::Client` if the HTTP client cannot be built
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let api_base = Url::parse(&config.api_base_url)
            .map_err(|_| GithubError::InvalidAddress(config.api_base_url.clone()))?;
        let token = config
            .token
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|t| !t.is_empty());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.raw"),
        );
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent)
            .build()?;

        if token.is_none() {
            tracing::debug!("no GitHub token configured; using anonymous access");
        }

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    fn contents_url(
        &self,
        repository: &RepositoryAddress,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Url, FetchError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidAddress(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["repos", repository.owner.as_str(), repository.repo.as_str(), "contents"])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        url.query_pairs_mut().append_pair("ref", revision.as_str());
        Ok(url)
    }
}

#[async_trait]
impl ContentFetcher for GithubFetcher {
    async fn get_content_at(
        &self,
        repository: &str,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, FetchError> {
        let address = RepositoryAddress::parse(repository)
            .map_err(|_| FetchError::InvalidAddress(repository.to_string()))?;
        let url = self.contents_url(&address, path, revision)?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(repository = %address, path, revision = %revision, "file not present");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let content = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        tracing::debug!(
            repository = %address,
            path,
            revision = %revision,
            bytes = content.len(),
            "fetched content"
        );
        Ok(Some(content))
    }
}
