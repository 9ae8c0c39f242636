//! Configuration schema definitions.
//!
//! This module defines the complete settings structure for the panel
//! reconciliation engine. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the panel.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PanelConfig {
    /// Control-plane endpoint settings.
    pub control_plane: ControlPlaneSettings,

    /// Retry/backoff tuning for publish attempts.
    pub retry: RetrySettings,

    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Control-plane endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlPlaneSettings {
    /// Base URL of the control-plane admin API (e.g., "http://127.0.0.1:2019").
    pub base_url: String,

    /// Admin listen address written into generated documents. The publisher
    /// preserves the running server's own admin block when one exists, so
    /// this only takes effect on a cold start.
    pub admin_listen: String,

    /// Per-request timeout in seconds for status and certificate probes.
    pub probe_timeout_secs: u64,

    /// Per-request timeout in seconds for config read/load calls.
    pub request_timeout_secs: u64,
}

impl Default for ControlPlaneSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:2019".to_string(),
            admin_listen: "0.0.0.0:2019".to_string(),
            probe_timeout_secs: 3,
            request_timeout_secs: 10,
        }
    }
}

impl ControlPlaneSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry configuration for publish attempts.
///
/// An explicit struct rather than module-level constants so tests can inject
/// zero-delay variants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Number of retries after the first attempt.
    pub max_retries: u32,

    /// Initial delay between attempts in milliseconds.
    pub initial_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
