//! Host record types.
//!
//! A host record is one declared domain-to-backend proxy mapping plus its
//! policy flags. Records are mutated only through the reconciliation
//! orchestrator; every mutation is followed by a full document rebuild from
//! the entire current host set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::secret::StoredSecret;

/// Backend scheme for the proxied upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetProtocol {
    #[default]
    Http,
    Https,
}

/// One declared reverse-proxy mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostRecord {
    /// Opaque identifier, assigned at creation.
    pub id: i64,

    /// Domain to match. Intended-unique; duplicates are not rejected here and
    /// produce independent routes in list order.
    pub domain: String,

    /// Backend address.
    pub target_host: String,
    pub target_port: u16,
    pub target_protocol: TargetProtocol,

    /// TLS policy flags.
    pub ssl_enabled: bool,
    pub force_ssl: bool,
    pub http2_support: bool,
    pub http3_support: bool,
    pub ignore_invalid_cert: bool,

    /// Disabled hosts are excluded from the generated document entirely.
    pub enabled: bool,

    /// Basic-auth settings. The password is stored as a bcrypt hash, never
    /// plaintext; an invalid or missing hash means no auth handler is
    /// emitted for this host.
    pub basic_auth_enabled: bool,
    pub basic_auth_username: String,
    pub basic_auth_password: StoredSecret,

    /// Free-form operator-authored route fragments, parsed independently.
    pub advanced_config: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a host record. Id and timestamps are assigned by the
/// store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewHost {
    pub domain: String,
    pub target_host: String,
    pub target_port: u16,
    #[serde(default)]
    pub target_protocol: TargetProtocol,
    #[serde(default)]
    pub ssl_enabled: bool,
    #[serde(default)]
    pub force_ssl: bool,
    #[serde(default)]
    pub http2_support: bool,
    #[serde(default)]
    pub http3_support: bool,
    #[serde(default)]
    pub ignore_invalid_cert: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub basic_auth_enabled: bool,
    #[serde(default)]
    pub basic_auth_username: String,
    #[serde(default)]
    pub basic_auth_password: StoredSecret,
    #[serde(default)]
    pub advanced_config: String,
}

fn default_enabled() -> bool {
    true
}

/// Partial update for an existing host record. `None` fields are left
/// untouched; the password field distinguishes "not supplied" from an
/// explicit clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostChanges {
    pub domain: Option<String>,
    pub target_host: Option<String>,
    pub target_port: Option<u16>,
    pub target_protocol: Option<TargetProtocol>,
    pub ssl_enabled: Option<bool>,
    pub force_ssl: Option<bool>,
    pub http2_support: Option<bool>,
    pub http3_support: Option<bool>,
    pub ignore_invalid_cert: Option<bool>,
    pub basic_auth_enabled: Option<bool>,
    pub basic_auth_username: Option<String>,
    /// `Some(StoredSecret::Absent)` clears the stored hash.
    pub basic_auth_password: Option<StoredSecret>,
    pub advanced_config: Option<String>,
}

impl HostChanges {
    /// Apply this change set to a record, returning the updated copy.
    /// Timestamps are refreshed by the store, not here.
    pub fn apply_to(&self, record: &HostRecord) -> HostRecord {
        let mut updated = record.clone();
        if let Some(v) = &self.domain {
            updated.domain = v.clone();
        }
        if let Some(v) = &self.target_host {
            updated.target_host = v.clone();
        }
        if let Some(v) = self.target_port {
            updated.target_port = v;
        }
        if let Some(v) = self.target_protocol {
            updated.target_protocol = v;
        }
        if let Some(v) = self.ssl_enabled {
            updated.ssl_enabled = v;
        }
        if let Some(v) = self.force_ssl {
            updated.force_ssl = v;
        }
        if let Some(v) = self.http2_support {
            updated.http2_support = v;
        }
        if let Some(v) = self.http3_support {
            updated.http3_support = v;
        }
        if let Some(v) = self.ignore_invalid_cert {
            updated.ignore_invalid_cert = v;
        }
        if let Some(v) = self.basic_auth_enabled {
            updated.basic_auth_enabled = v;
        }
        if let Some(v) = &self.basic_auth_username {
            updated.basic_auth_username = v.clone();
        }
        if let Some(v) = &self.basic_auth_password {
            updated.basic_auth_password = v.clone();
        }
        if let Some(v) = &self.advanced_config {
            updated.advanced_config = v.clone();
        }
        updated
    }
}
