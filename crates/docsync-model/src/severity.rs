//! Change severity on a 1-10 scale
//!
//! Severity drives the auto-apply gate: only changes strictly below
//! [`AUTO_APPLY_THRESHOLD`] may be propagated without review. The gate lives
//! here so every layer that writes a change record uses the same cut-off.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severities at or above this value always require human review
pub const AUTO_APPLY_THRESHOLD: u8 = 7;

/// Impact severity, guaranteed to lie in 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Severity(u8);

impl Severity {
    /// Lowest severity
    pub const MIN: Self = Self(1);
    /// Highest severity: breaking, human required
    pub const MAX: Self = Self(10);

    /// Create a severity, rejecting values outside 1..=10
    ///
    /// # Errors
    /// - `ModelError::SeverityOutOfRange` for anything outside 1..=10
    pub fn new(value: i64) -> Result<Self, ModelError> {
        match u8::try_from(value) {
            Ok(v) if (1..=10).contains(&v) => Ok(Self(v)),
            _ => Err(ModelError::SeverityOutOfRange(value)),
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Impact band this severity falls in
    #[must_use]
    pub fn band(self) -> SeverityBand {
        match self.0 {
            1..=3 => SeverityBand::Cosmetic,
            4..=6 => SeverityBand::Clarifying,
            7..=9 => SeverityBand::ProcessImpacting,
            _ => SeverityBand::Breaking,
        }
    }

    /// Whether a change of this severity may be applied without review
    #[inline]
    #[must_use]
    pub fn permits_auto_apply(self) -> bool {
        self.0 < AUTO_APPLY_THRESHOLD
    }
}

impl TryFrom<i64> for Severity {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// Coarse impact band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    /// 1-3: typo, formatting
    Cosmetic,
    /// 4-6: clarification, extra information
    Clarifying,
    /// 7-9: process change, new requirements
    ProcessImpacting,
    /// 10: breaking, requires a human
    Breaking,
}
