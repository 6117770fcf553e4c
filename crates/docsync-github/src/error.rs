//! GitHub integration errors

/// Errors raised by the GitHub collaborator
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// Not a recognizable GitHub repository address
    #[error("invalid GitHub repository address: {0}")]
    InvalidAddress(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Webhook body is not a valid payload for its event
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
