//! Anthropic messages API oracle

use super::{extract_json, ReasoningOracle, StructuredRequest};
use crate::error::OracleError;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Connection settings for [`AnthropicOracle`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// `anthropic-version` header value
    pub api_version: String,
    /// API key; falls back to `ANTHROPIC_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_version: "2023-06-01".to_string(),
            api_key: None,
        }
    }
}

impl AnthropicConfig {
    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Oracle backed by the Anthropic messages API
#[derive(Debug, Clone)]
pub struct AnthropicOracle {
    client: Client,
    config: AnthropicConfig,
    api_key: String,
}

impl AnthropicOracle {
    /// Create an oracle
    ///
    /// # Errors
    /// - `OracleError::Config` when no API key is configured or in the
    ///   environment
    /// - `OracleError::Transport` when the HTTP client cannot be built
    pub fn new(config: AnthropicConfig) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| OracleError::Config(format!("{API_KEY_ENV} is not set")))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ReasoningOracle for AnthropicOracle {
    fn id(&self) -> &str {
        &self.config.model
    }

    async fn analyze_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, OracleError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt.as_deref(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.render(),
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(OracleError::RateLimited);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(OracleError::EmptyResponse)?;

        tracing::debug!(model = %self.config.model, chars = text.len(), "oracle replied");

        extract_json(&text).map_err(|e| {
            tracing::warn!(model = %self.config.model, "oracle reply was not JSON");
            e
        })
    }
}
