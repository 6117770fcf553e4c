//! docsync data model
//!
//! Records shared by the classifier, the orchestrator and the record store:
//! - Documentation sources (plan subscriptions to an origin)
//! - Onboarding steps and their content blocks
//! - Source change records (the audit trail)
//! - Severity and the auto-apply threshold
//!
//! Enumerated fields are closed enums validated at the store boundary.

#![warn(unreachable_pub)]

pub mod change;
pub mod error;
pub mod ids;
pub mod kinds;
pub mod severity;
pub mod source;
pub mod step;

pub use change::{DiffMetadata, SourceChangeRecord};
pub use error::ModelError;
pub use ids::{ChangeId, OrganizationId, PlanId, SourceId, StepId};
pub use kinds::{ChangeKind, OriginKind, StepKind, SyncCadence};
pub use severity::{Severity, SeverityBand, AUTO_APPLY_THRESHOLD};
pub use source::{content_fingerprint, DocumentationSource};
pub use step::{ensure_unique_titles, find_by_title, OnboardingStep, StepContent};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
