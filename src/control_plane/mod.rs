//! Control-plane integration.
//!
//! # Data Flow
//! ```text
//! document builder output
//!     → Publisher (preserve admin block, POST /load, retry with backoff)
//! UI reads
//!     → status()/certificate_status() probes (best-effort, never raise)
//! ```

pub mod client;

pub use client::{CertificateInfo, ControlPlaneClient, ControlPlaneStatus};

use async_trait::async_trait;

use crate::document::ConfigDocument;
use crate::error::PanelResult;

/// The seam the orchestrator publishes through. Lets tests substitute a
/// failing or recording publisher without a live control plane.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, doc: &ConfigDocument) -> PanelResult<()>;
}

#[async_trait]
impl Publisher for ControlPlaneClient {
    async fn publish(&self, doc: &ConfigDocument) -> PanelResult<()> {
        ControlPlaneClient::publish(self, doc).await
    }
}
