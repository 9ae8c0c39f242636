//! Error taxonomy for reconciliation operations.
//!
//! # Design Decisions
//! - One error enum per boundary; this is the use-case-level taxonomy the
//!   UI layer maps onto HTTP responses
//! - Control-plane failures carry status and raw diagnostic text so the
//!   operator can see what the remote server rejected
//! - Validation failures are raised before any mutation occurs

use thiserror::Error;

/// Errors surfaced by the control-plane client.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The control plane rejected the submitted document.
    #[error("control plane rejected configuration ({status}): {detail}")]
    ApplyRejected { status: u16, detail: String },

    /// The control plane could not be reached at all.
    #[error("control plane unreachable: {0}")]
    Unreachable(String),
}

impl ControlPlaneError {
    /// Machine-readable failure code for logs and the UI layer.
    pub fn code(&self) -> &'static str {
        match self {
            ControlPlaneError::ApplyRejected { .. } => "apply_failed",
            ControlPlaneError::Unreachable(_) => "unreachable",
        }
    }
}

/// Errors surfaced by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store failed (connection, constraint, corruption).
    #[error("storage error: {0}")]
    Backend(String),

    /// The transaction could not be committed or rolled back.
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Use-case-level errors for orchestrated host operations.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Input rejected before any mutation was performed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The mutation target record does not exist.
    #[error("host {0} not found")]
    NotFound(i64),

    /// Reading or applying the document at the control plane failed after
    /// retries were exhausted. The triggering mutation has been undone.
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),

    /// The storage collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Anything else; logged with full context, surfaced generically.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PanelError {
    /// HTTP status class the UI layer should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PanelError::Validation(_) => 400,
            PanelError::NotFound(_) => 404,
            PanelError::ControlPlane(_) => 503,
            PanelError::Store(_) | PanelError::Internal(_) => 500,
        }
    }
}

/// Result type for orchestrated operations.
pub type PanelResult<T> = Result<T, PanelError>;
