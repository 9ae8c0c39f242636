//! Reconciliation orchestration.
//!
//! Every host mutation runs as one unit of work: mutate the record set,
//! rebuild the document from the full host set, publish it, then commit.
//! If publishing fails the orchestrator performs an explicit compensating
//! undo of the just-made mutation before aborting the transaction — the
//! storage layer's transaction semantics are an external contract, and how
//! reliably they roll back on a surfaced error varies by backend, so both
//! mechanisms are used.

use serde_json::json;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::config::ControlPlaneSettings;
use crate::control_plane::Publisher;
use crate::document::{build_document, ConfigDocument};
use crate::error::{PanelError, PanelResult};
use crate::store::{
    normalize_hosts, HostChanges, HostRecord, HostStore, HostTx, NewHost, StoredSecret,
};

/// Coordinates host mutations with document rebuild and publish.
pub struct Reconciler<S, P, A> {
    store: S,
    publisher: P,
    audit: A,
    settings: ControlPlaneSettings,
}

/// Compensating action applied before a transaction aborts.
enum Undo {
    Delete(i64),
    Restore(HostRecord),
    Revert(HostRecord),
}

impl<S, P, A> Reconciler<S, P, A>
where
    S: HostStore,
    P: Publisher,
    A: AuditSink,
{
    pub fn new(store: S, publisher: P, audit: A, settings: ControlPlaneSettings) -> Self {
        Self { store, publisher, audit, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a host record and publish the resulting document.
    pub async fn create_host(&self, new: NewHost, actor: Option<&str>) -> PanelResult<HostRecord> {
        validate_new_host(&new)?;

        let mut tx = self.store.begin().await?;
        let record = tx.insert(new).await?;

        if let Err(e) = self.rebuild_and_publish(tx.as_mut()).await {
            tracing::warn!(domain = %record.domain, error = %e, "publish failed, undoing create");
            undo_and_abort(tx, Undo::Delete(record.id)).await;
            return Err(e);
        }

        self.record_audit(
            AuditAction::Created,
            record.id,
            actor,
            json!({ "domain": record.domain }),
        )
        .await;
        tx.commit().await?;
        Ok(record)
    }

    /// Apply a partial update to a host record and publish.
    pub async fn update_host(
        &self,
        id: i64,
        changes: HostChanges,
        actor: Option<&str>,
    ) -> PanelResult<HostRecord> {
        let mut tx = self.store.begin().await?;
        let existing = tx.select_by_id(id).await?.ok_or(PanelError::NotFound(id))?;

        let updated = changes.apply_to(&existing);
        validate_record(&updated)?;

        tx.update(&updated).await?;

        if let Err(e) = self.rebuild_and_publish(tx.as_mut()).await {
            tracing::warn!(host_id = id, error = %e, "publish failed, reverting update");
            undo_and_abort(tx, Undo::Revert(existing)).await;
            return Err(e);
        }

        let stored = tx.select_by_id(id).await?.ok_or(PanelError::NotFound(id))?;
        self.record_audit(
            AuditAction::Updated,
            id,
            actor,
            json!({ "fields": changed_fields(&changes) }),
        )
        .await;
        tx.commit().await?;
        Ok(stored)
    }

    /// Delete a host record and publish the shrunk document.
    pub async fn delete_host(&self, id: i64, actor: Option<&str>) -> PanelResult<()> {
        let mut tx = self.store.begin().await?;
        let existing = tx.select_by_id(id).await?.ok_or(PanelError::NotFound(id))?;

        tx.delete(id).await?;

        if let Err(e) = self.rebuild_and_publish(tx.as_mut()).await {
            tracing::warn!(host_id = id, error = %e, "publish failed, restoring deleted host");
            undo_and_abort(tx, Undo::Restore(existing)).await;
            return Err(e);
        }

        self.record_audit(
            AuditAction::Deleted,
            id,
            actor,
            json!({ "domain": existing.domain }),
        )
        .await;
        tx.commit().await?;
        Ok(())
    }

    /// Enable or disable a host and publish. Toggling to the current state
    /// is allowed and still republishes.
    pub async fn set_host_enabled(
        &self,
        id: i64,
        enabled: bool,
        actor: Option<&str>,
    ) -> PanelResult<HostRecord> {
        let mut tx = self.store.begin().await?;
        let existing = tx.select_by_id(id).await?.ok_or(PanelError::NotFound(id))?;

        let mut updated = existing.clone();
        updated.enabled = enabled;
        tx.update(&updated).await?;

        if let Err(e) = self.rebuild_and_publish(tx.as_mut()).await {
            tracing::warn!(host_id = id, error = %e, "publish failed, reverting toggle");
            undo_and_abort(tx, Undo::Revert(existing)).await;
            return Err(e);
        }

        let stored = tx.select_by_id(id).await?.ok_or(PanelError::NotFound(id))?;
        let action = if enabled { AuditAction::Enabled } else { AuditAction::Disabled };
        self.record_audit(action, id, actor, json!({ "enabled": enabled })).await;
        tx.commit().await?;
        Ok(stored)
    }

    /// Rebuild from the current store contents and publish, with no record
    /// mutation. Used for startup resync and the CLI.
    pub async fn sync(&self) -> PanelResult<ConfigDocument> {
        let hosts = normalize_hosts(self.store.select_all().await?);
        let doc = build_document(&hosts, &self.settings);
        self.publisher.publish(&doc).await?;
        Ok(doc)
    }

    /// Read-after-write: the document always observes the host set as
    /// mutated inside this transaction.
    async fn rebuild_and_publish(&self, tx: &mut dyn HostTx) -> PanelResult<()> {
        let hosts = normalize_hosts(tx.select_all().await?);
        let doc = build_document(&hosts, &self.settings);
        self.publisher.publish(&doc).await
    }

    async fn record_audit(
        &self,
        action: AuditAction,
        entity_id: i64,
        actor: Option<&str>,
        changes: serde_json::Value,
    ) {
        let entry = AuditEntry::host(action, entity_id, actor.map(str::to_string), changes);
        if let Err(e) = self.audit.record(entry).await {
            tracing::warn!(error = %e, "audit sink failed");
        }
    }
}

/// Undo the mutation, then abort. Failures here are logged, not surfaced:
/// the caller already holds the publish error.
async fn undo_and_abort(mut tx: Box<dyn HostTx>, undo: Undo) {
    let result = match &undo {
        Undo::Delete(id) => tx.delete(*id).await.map(|_| ()),
        Undo::Restore(record) => tx.restore(record).await,
        Undo::Revert(record) => tx.update(record).await,
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "compensating undo failed");
    }
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "transaction rollback failed");
    }
}

fn validate_new_host(new: &NewHost) -> PanelResult<()> {
    collect_problems(
        &new.domain,
        &new.target_host,
        new.target_port,
        new.basic_auth_enabled,
        &new.basic_auth_username,
        &new.basic_auth_password,
    )
}

fn validate_record(record: &HostRecord) -> PanelResult<()> {
    collect_problems(
        &record.domain,
        &record.target_host,
        record.target_port,
        record.basic_auth_enabled,
        &record.basic_auth_username,
        &record.basic_auth_password,
    )
}

fn collect_problems(
    domain: &str,
    target_host: &str,
    target_port: u16,
    auth_enabled: bool,
    username: &str,
    password: &StoredSecret,
) -> PanelResult<()> {
    let mut problems: Vec<&str> = Vec::new();

    if domain.trim().is_empty() {
        problems.push("domain must not be empty");
    }
    if target_host.trim().is_empty() {
        problems.push("target host must not be empty");
    }
    if target_port == 0 {
        problems.push("target port must not be zero");
    }
    if auth_enabled {
        if username.trim().is_empty() {
            problems.push("basic auth requires a username");
        }
        if !password.is_usable_hash() {
            problems.push("basic auth requires a stored bcrypt password hash");
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PanelError::Validation(problems.join("; ")))
    }
}

fn changed_fields(changes: &HostChanges) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if changes.domain.is_some() {
        fields.push("domain");
    }
    if changes.target_host.is_some() {
        fields.push("target_host");
    }
    if changes.target_port.is_some() {
        fields.push("target_port");
    }
    if changes.target_protocol.is_some() {
        fields.push("target_protocol");
    }
    if changes.ssl_enabled.is_some() {
        fields.push("ssl_enabled");
    }
    if changes.force_ssl.is_some() {
        fields.push("force_ssl");
    }
    if changes.http2_support.is_some() {
        fields.push("http2_support");
    }
    if changes.http3_support.is_some() {
        fields.push("http3_support");
    }
    if changes.ignore_invalid_cert.is_some() {
        fields.push("ignore_invalid_cert");
    }
    if changes.basic_auth_enabled.is_some() {
        fields.push("basic_auth_enabled");
    }
    if changes.basic_auth_username.is_some() {
        fields.push("basic_auth_username");
    }
    if changes.basic_auth_password.is_some() {
        fields.push("basic_auth_password");
    }
    if changes.advanced_config.is_some() {
        fields.push("advanced_config");
    }
    fields
}
