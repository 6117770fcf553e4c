//! Closed enumerations for origin, cadence, step and change kinds
//!
//! Each enum accepts its canonical wire tag and, where older rows used
//! vendor-specific tags, those legacy spellings as aliases. Anything else is
//! rejected both by `FromStr` and by serde.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a documentation source lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Source repository (files at revisions)
    #[serde(alias = "github")]
    Repository,
    /// Wiki pages
    #[serde(alias = "notion", alias = "confluence")]
    Wiki,
    /// Hosted documents
    #[serde(alias = "gdocs")]
    Document,
    /// Chat channels
    #[serde(alias = "slack")]
    Chat,
    /// Issue tracker
    #[serde(alias = "linear")]
    IssueTracker,
}

impl OriginKind {
    /// Canonical wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Wiki => "wiki",
            Self::Document => "document",
            Self::Chat => "chat",
            Self::IssueTracker => "issue_tracker",
        }
    }
}

impl FromStr for OriginKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repository" | "github" => Ok(Self::Repository),
            "wiki" | "notion" | "confluence" => Ok(Self::Wiki),
            "document" | "gdocs" => Ok(Self::Document),
            "chat" | "slack" => Ok(Self::Chat),
            "issue_tracker" | "linear" => Ok(Self::IssueTracker),
            _ => Err(ModelError::unknown_tag("origin kind", s)),
        }
    }
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a source is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCadence {
    /// On every change notification
    #[serde(alias = "realtime")]
    Immediate,
    /// Hourly
    Hourly,
    /// Daily
    #[default]
    Daily,
}

impl SyncCadence {
    /// Canonical wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl FromStr for SyncCadence {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "realtime" => Ok(Self::Immediate),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            _ => Err(ModelError::unknown_tag("sync cadence", s)),
        }
    }
}

impl fmt::Display for SyncCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of onboarding step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Environment setup
    Setup,
    /// Reading material
    Documentation,
    /// Hands-on task
    Task,
    /// Check that earlier steps worked
    Verification,
}

impl StepKind {
    /// Canonical wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Documentation => "documentation",
            Self::Task => "task",
            Self::Verification => "verification",
        }
    }
}

impl FromStr for StepKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "setup" => Ok(Self::Setup),
            "documentation" => Ok(Self::Documentation),
            "task" => Ok(Self::Task),
            "verification" => Ok(Self::Verification),
            _ => Err(ModelError::unknown_tag("step kind", s)),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Text changed in place
    #[default]
    Content,
    /// Document structure changed
    Structure,
    /// Document removed
    Deletion,
}

impl ChangeKind {
    /// Canonical wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Structure => "structure",
            Self::Deletion => "deletion",
        }
    }
}

impl FromStr for ChangeKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "structure" => Ok(Self::Structure),
            "deletion" => Ok(Self::Deletion),
            _ => Err(ModelError::unknown_tag("change kind", s)),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_kind_accepts_legacy_tags() {
        assert_eq!("github".parse::<OriginKind>().unwrap(), OriginKind::Repository);
        assert_eq!("Confluence".parse::<OriginKind>().unwrap(), OriginKind::Wiki);
        assert_eq!("linear".parse::<OriginKind>().unwrap(), OriginKind::IssueTracker);

        let kind: OriginKind = serde_json::from_str("\"slack\"").unwrap();
        assert_eq!(kind, OriginKind::Chat);
    }

    #[test]
    fn origin_kind_rejects_unknown() {
        assert!("gitlab".parse::<OriginKind>().is_err());
        assert!(serde_json::from_str::<OriginKind>("\"gitlab\"").is_err());
    }

    #[test]
    fn origin_kind_serializes_canonical_tag() {
        let json = serde_json::to_string(&OriginKind::IssueTracker).unwrap();
        assert_eq!(json, "\"issue_tracker\"");
        assert_eq!(OriginKind::IssueTracker.as_str(), "issue_tracker");
    }

    #[test]
    fn cadence_defaults_to_daily() {
        assert_eq!(SyncCadence::default(), SyncCadence::Daily);
        assert_eq!("realtime".parse::<SyncCadence>().unwrap(), SyncCadence::Immediate);
    }

    #[test]
    fn step_kind_round_trips_through_display() {
        for kind in [
            StepKind::Setup,
            StepKind::Documentation,
            StepKind::Task,
            StepKind::Verification,
        ] {
            assert_eq!(kind.to_string().parse::<StepKind>().unwrap(), kind);
        }
        assert!("chore".parse::<StepKind>().is_err());
    }

    #[test]
    fn change_kind_rejects_legacy_modified() {
        assert!("modified".parse::<ChangeKind>().is_err());
        assert_eq!("deletion".parse::<ChangeKind>().unwrap(), ChangeKind::Deletion);
    }
}
