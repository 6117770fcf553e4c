//! Reasoning oracle seam
//!
//! The classifier hands the oracle a natural-language prompt plus a schema
//! description and gets back a JSON value (or a failure). Concrete oracles:
//! - [`AnthropicOracle`]: messages API over HTTP
//!
//! Tests inject their own implementations.

mod anthropic;

pub use anthropic::{AnthropicConfig, AnthropicOracle};

use crate::error::OracleError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A structured-output request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequest {
    /// System prompt
    pub system_prompt: Option<String>,
    /// Task prompt
    pub prompt: String,
    /// Description of the expected JSON shape
    pub schema: String,
    /// Output token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl StructuredRequest {
    /// Create a request
    #[must_use]
    pub fn new(prompt: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            schema: schema.into(),
            max_tokens: 4096,
            temperature: 0.3,
        }
    }

    /// With system prompt
    #[inline]
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// With token budget
    #[inline]
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// With temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Full user message: task prompt followed by the schema and the
    /// JSON-only instruction
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}\n\nPlease respond with valid JSON matching this schema:\n{}\n\n\
             Return ONLY the JSON, no additional text or markdown formatting.",
            self.prompt, self.schema
        )
    }
}

/// External reasoning engine producing structured JSON
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Backend identifier (model name)
    fn id(&self) -> &str;

    /// Run a structured request
    ///
    /// # Errors
    /// Any transport, status or parse failure
    async fn analyze_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, OracleError>;
}

/// Parse a model reply as JSON, tolerating one surrounding Markdown fence
///
/// # Errors
/// - `OracleError::InvalidJson` when the unwrapped text is not JSON
pub fn extract_json(reply: &str) -> Result<serde_json::Value, OracleError> {
    let text = reply.trim();
    let body = strip_code_fence(text).unwrap_or(text);
    Ok(serde_json::from_str(body.trim())?)
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Drop the info string (```json) up to the first newline.
    let (_, rest) = rest.split_once('\n')?;
    Some(rest.trim_end().strip_suffix("```").unwrap_or(rest))
}
