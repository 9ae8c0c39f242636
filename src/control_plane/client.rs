//! Control-plane HTTP client.
//!
//! # Responsibilities
//! - Push generated documents to the load endpoint with bounded retry
//! - Preserve the running server's admin block across publishes
//! - Probe liveness and per-domain certificate metadata
//!
//! # Design Decisions
//! - Publish failures propagate: reconciliation correctness depends on the
//!   caller knowing the document was not applied
//! - Status and certificate probes swallow failures into "not running"/None;
//!   they are best-effort reads for the UI
//! - Every request carries its own timeout so a hung control plane cannot
//!   block the caller indefinitely

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ControlPlaneSettings;
use crate::document::ConfigDocument;
use crate::error::{ControlPlaneError, PanelError, PanelResult};
use crate::resilience::{retry_with_backoff, RetryPolicy};

/// Liveness snapshot of the remote control plane.
#[derive(Debug, Clone, Serialize)]
pub struct ControlPlaneStatus {
    pub running: bool,
    pub version: String,
    /// The currently-loaded document, when the read endpoint returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
}

/// Certificate metadata for one domain, as reported by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub not_before: Option<String>,
    #[serde(default)]
    pub not_after: Option<String>,
    #[serde(default)]
    pub sans: Vec<String>,
    /// Fields this crate does not model, preserved for display.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// HTTP client for the control plane's admin API.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    settings: ControlPlaneSettings,
    retry: RetryPolicy,
}

impl ControlPlaneClient {
    pub fn new(settings: ControlPlaneSettings, retry: RetryPolicy) -> PanelResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PanelError::Internal(format!("http client init failed: {}", e)))?;
        Ok(Self { http, settings, retry })
    }

    pub fn settings(&self) -> &ControlPlaneSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Publish a document. Idempotent in intent: re-publishing the same
    /// document is observably a no-op at the control plane, though every
    /// call performs network I/O.
    pub async fn publish(&self, doc: &ConfigDocument) -> PanelResult<()> {
        let outgoing = serde_json::to_value(doc)
            .map_err(|e| PanelError::Internal(format!("document serialization failed: {}", e)))?;

        retry_with_backoff(self.retry, || self.attempt_publish(&outgoing))
            .await
            .map_err(PanelError::from)
    }

    async fn attempt_publish(&self, outgoing: &Value) -> Result<(), ControlPlaneError> {
        let mut document = outgoing.clone();

        // The control plane owns its admin surface; submitting a document
        // that changes it can be rejected, and the operator's externally
        // configured admin address must survive a publish. Best-effort read,
        // not a compare-and-swap.
        if let Some(admin) = self.running_admin_block().await {
            document["admin"] = admin;
        }

        let response = self
            .http
            .post(self.endpoint("load"))
            .timeout(self.settings.request_timeout())
            .json(&document)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("configuration applied at control plane");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(ControlPlaneError::ApplyRejected { status: status.as_u16(), detail })
    }

    /// The `admin` sub-block of the currently-running document, when the
    /// read endpoint yields one.
    async fn running_admin_block(&self) -> Option<Value> {
        let response = self
            .http
            .get(self.endpoint("config/"))
            .timeout(self.settings.request_timeout())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let running: Value = resp.json().await.ok()?;
                let admin = running.get("admin")?;
                admin.is_object().then(|| admin.clone())
            }
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "no running document to preserve admin block from");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "could not read running document");
                None
            }
        }
    }

    /// Probe a short candidate list of endpoints for liveness. A 404 counts
    /// as "server up, nothing loaded yet". Never fails; exhausting all
    /// candidates means not running.
    pub async fn status(&self) -> ControlPlaneStatus {
        for path in ["config/", ""] {
            let result = self
                .http
                .get(self.endpoint(path))
                .timeout(self.settings.probe_timeout())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let http_status = response.status();
                    if http_status.is_success() || http_status == reqwest::StatusCode::NOT_FOUND {
                        let version = response
                            .headers()
                            .get("server")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown")
                            .to_string();
                        let document = if path == "config/" && http_status.is_success() {
                            response.json().await.ok()
                        } else {
                            None
                        };
                        return ControlPlaneStatus { running: true, version, document };
                    }
                    tracing::debug!(endpoint = path, status = %http_status, "candidate endpoint failed");
                }
                Err(e) => {
                    tracing::debug!(endpoint = path, error = %e, "candidate endpoint unreachable");
                }
            }
        }

        ControlPlaneStatus {
            running: false,
            version: "unknown".to_string(),
            document: None,
        }
    }

    /// Certificate metadata for one domain. Best-effort UI decoration: a 404
    /// means no certificate yet, and every other failure is logged and
    /// treated as None.
    pub async fn certificate_status(&self, domain: &str) -> Option<CertificateInfo> {
        let result = self
            .http
            .get(self.endpoint(&format!("certificates/{}", domain)))
            .timeout(self.settings.probe_timeout())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(domain, error = %e, "certificate response was not parsable");
                    None
                }
            },
            Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => None,
            Ok(response) => {
                tracing::warn!(domain, status = %response.status(), "certificate query failed");
                None
            }
            Err(e) => {
                tracing::warn!(domain, error = %e, "certificate query unreachable");
                None
            }
        }
    }
}
