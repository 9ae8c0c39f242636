//! Audit trail sink.
//!
//! The orchestrator records one entry per successful mutation. Recording is
//! fire-and-forget: a failing sink must never affect reconciliation outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// What happened to a host record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Enabled,
    Disabled,
}

/// One audit record. Change sets carry field summaries, never credentials.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub changes: Value,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn host(action: AuditAction, entity_id: i64, user_id: Option<String>, changes: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            entity_type: "host",
            entity_id,
            user_id,
            changes,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
#[error("audit sink error: {0}")]
pub struct AuditError(pub String);

/// Destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Default sink: structured log events.
#[derive(Debug, Clone, Default)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        tracing::info!(
            audit_id = %entry.id,
            action = ?entry.action,
            entity_type = entry.entity_type,
            entity_id = entry.entity_id,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            changes = %entry.changes,
            "audit"
        );
        Ok(())
    }
}
