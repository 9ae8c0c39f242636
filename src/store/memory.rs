//! In-memory host store with snapshot transactions.
//!
//! Reference implementation of the storage interface: transactions work on a
//! cloned snapshot and publish it wholesale on commit. Good enough for the
//! demo binary and for tests; a relational backend implements the same
//! traits against real transactions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StoreError;
use crate::store::record::{HostRecord, NewHost};
use crate::store::{HostStore, HostTx};

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    hosts: BTreeMap<i64, HostRecord>,
}

/// Shared in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl HostStore for MemoryStore {
    async fn select_all(&self) -> Result<Vec<HostRecord>, StoreError> {
        Ok(self.lock()?.hosts.values().cloned().collect())
    }

    async fn select_by_id(&self, id: i64) -> Result<Option<HostRecord>, StoreError> {
        Ok(self.lock()?.hosts.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn HostTx>, StoreError> {
        let snapshot = {
            let inner = self.lock()?;
            (inner.next_id, inner.hosts.clone())
        };
        Ok(Box::new(MemoryTx {
            shared: Arc::clone(&self.inner),
            next_id: snapshot.0,
            working: snapshot.1,
        }))
    }
}

/// A transaction over a snapshot of the store. Commit replaces the shared
/// state; rollback is a no-op drop.
struct MemoryTx {
    shared: Arc<Mutex<MemoryInner>>,
    next_id: i64,
    working: BTreeMap<i64, HostRecord>,
}

#[async_trait]
impl HostTx for MemoryTx {
    async fn select_all(&mut self) -> Result<Vec<HostRecord>, StoreError> {
        Ok(self.working.values().cloned().collect())
    }

    async fn select_by_id(&mut self, id: i64) -> Result<Option<HostRecord>, StoreError> {
        Ok(self.working.get(&id).cloned())
    }

    async fn insert(&mut self, host: NewHost) -> Result<HostRecord, StoreError> {
        self.next_id += 1;
        let now = Utc::now();
        let record = HostRecord {
            id: self.next_id,
            domain: host.domain,
            target_host: host.target_host,
            target_port: host.target_port,
            target_protocol: host.target_protocol,
            ssl_enabled: host.ssl_enabled,
            force_ssl: host.force_ssl,
            http2_support: host.http2_support,
            http3_support: host.http3_support,
            ignore_invalid_cert: host.ignore_invalid_cert,
            enabled: host.enabled,
            basic_auth_enabled: host.basic_auth_enabled,
            basic_auth_username: host.basic_auth_username,
            basic_auth_password: host.basic_auth_password,
            advanced_config: host.advanced_config,
            created_at: now,
            updated_at: now,
        };
        self.working.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&mut self, record: &HostRecord) -> Result<(), StoreError> {
        match self.working.get_mut(&record.id) {
            Some(existing) => {
                let mut updated = record.clone();
                updated.created_at = existing.created_at;
                updated.updated_at = Utc::now();
                *existing = updated;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("no row with id {}", record.id))),
        }
    }

    async fn delete(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.working.remove(&id).is_some())
    }

    async fn restore(&mut self, record: &HostRecord) -> Result<(), StoreError> {
        self.working.insert(record.id, record.clone());
        if record.id > self.next_id {
            self.next_id = record.id;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut inner = self
            .shared
            .lock()
            .map_err(|_| StoreError::Transaction("store mutex poisoned".to_string()))?;
        inner.next_id = self.next_id;
        inner.hosts = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Snapshot is simply dropped.
        Ok(())
    }
}
