//! Documentation sources: one plan subscribed to one origin location

use crate::ids::{OrganizationId, PlanId, SourceId};
use crate::kinds::{OriginKind, SyncCadence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Subscription binding a plan to an origin location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationSource {
    /// Source identifier
    pub id: SourceId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Plan receiving propagated updates
    pub plan_id: PlanId,
    /// Kind of origin
    pub origin_kind: OriginKind,
    /// Origin address (repository URL, wiki URL, ...)
    pub origin_address: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional path filters within the origin
    #[serde(default)]
    pub path_filters: Vec<String>,
    /// Inactive sources are never processed
    pub active: bool,
    /// Last successful sync
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Fingerprint of the last content seen
    #[serde(default)]
    pub last_content_hash: Option<String>,
    /// Sync cadence
    #[serde(default)]
    pub cadence: SyncCadence,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl DocumentationSource {
    /// Create an active source with default cadence
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        plan_id: PlanId,
        origin_kind: OriginKind,
        origin_address: impl Into<String>,
    ) -> Self {
        Self {
            id: SourceId::new(),
            organization_id,
            plan_id,
            origin_kind,
            origin_address: origin_address.into(),
            display_name: None,
            path_filters: Vec::new(),
            active: true,
            last_synced_at: None,
            last_content_hash: None,
            cadence: SyncCadence::default(),
            created_at: Utc::now(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With path filters
    #[inline]
    #[must_use]
    pub fn with_path_filters(mut self, filters: Vec<String>) -> Self {
        self.path_filters = filters;
        self
    }

    /// With cadence
    #[inline]
    #[must_use]
    pub fn with_cadence(mut self, cadence: SyncCadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Whether this source takes part in sync at all
    #[inline]
    #[must_use]
    pub fn is_sync_eligible(&self) -> bool {
        self.active
    }

    /// Whether this source tracks the given origin
    #[must_use]
    pub fn tracks(&self, kind: OriginKind, address: &str) -> bool {
        self.origin_kind == kind && self.origin_address == address
    }

    /// Record a successful sync
    pub fn record_sync(&mut self, fingerprint: impl Into<String>, at: DateTime<Utc>) {
        self.last_content_hash = Some(fingerprint.into());
        self.last_synced_at = Some(at);
    }
}

/// SHA-256 hex fingerprint of a content snapshot
#[must_use]
pub fn content_fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
