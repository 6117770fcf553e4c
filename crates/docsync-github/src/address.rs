//! GitHub repository addresses

use crate::error::GithubError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://(?:www\.)?github\.com/|git@github\.com:|ssh://git@github\.com/)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$",
    )
    .expect("address pattern is valid")
});

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryAddress {
    /// Account or organization
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepositoryAddress {
    /// Parse an HTTPS or SSH repository address
    ///
    /// # Errors
    /// `GithubError::InvalidAddress` for anything else.
    pub fn parse(address: &str) -> Result<Self, GithubError> {
        let caps = ADDRESS
            .captures(address.trim())
            .ok_or_else(|| GithubError::InvalidAddress(address.to_string()))?;
        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
        })
    }

    /// Canonical browser URL
    #[must_use]
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepositoryAddress {
    type Err = GithubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
