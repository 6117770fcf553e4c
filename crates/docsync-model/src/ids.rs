//! Typed identifiers
//!
//! Every record kind gets its own ULID newtype so a plan id can never be
//! passed where a step id is expected. ULIDs sort by creation time, which
//! keeps change records in detection order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a fresh identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Owning organization of a source
    OrganizationId
);
define_id!(
    /// Onboarding plan identifier
    PlanId
);
define_id!(
    /// Documentation source (subscription) identifier
    SourceId
);
define_id!(
    /// Onboarding step identifier
    StepId
);
define_id!(
    /// Source change record identifier
    ChangeId
);
