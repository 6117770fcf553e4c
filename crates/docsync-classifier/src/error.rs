//! Error types for the classifier
//!
//! None of these escape [`crate::ChangeClassifier::classify`]; they are
//! logged and collapsed into the conservative verdict.

/// Reasoning oracle failures
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Oracle could not be reached
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("oracle returned HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Rate limited
    #[error("oracle rate limited")]
    RateLimited,

    /// Response had no text content
    #[error("oracle response contained no text")]
    EmptyResponse,

    /// Response text was not JSON
    #[error("oracle response was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Oracle misconfigured
    #[error("oracle configuration error: {0}")]
    Config(String),
}

/// Oracle JSON that does not fit the verdict contract
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    /// JSON shape mismatch
    #[error("verdict shape mismatch: {0}")]
    Shape(#[from] serde_json::Error),

    /// Severity is NaN or infinite
    #[error("severity is not a finite number")]
    NonFiniteSeverity,

    /// Severity outside 1..=10 after rounding
    #[error("severity out of range: {0}")]
    SeverityOutOfRange(#[from] docsync_model::ModelError),
}
