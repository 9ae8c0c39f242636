//! Storage collaborator interface.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → begin() (one transaction per orchestrated operation)
//!     → insert/update/delete + select_all (read-after-write)
//!     → commit on success, rollback on publish failure
//! ```
//!
//! # Design Decisions
//! - The relational schema and migrations live outside this crate; the store
//!   is consumed as a simple record store behind object-safe traits
//! - Transactions are explicit handles with consuming commit/rollback,
//!   mirroring sqlx's transaction API
//! - The in-memory implementation backs the binary's demo mode and tests

pub mod memory;
pub mod record;
pub mod secret;

pub use memory::MemoryStore;
pub use record::{HostChanges, HostRecord, NewHost, TargetProtocol};
pub use secret::{normalize_hosts, StoredSecret};

use async_trait::async_trait;

use crate::error::StoreError;

/// A record store holding host declarations.
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Read the full host set outside any transaction.
    async fn select_all(&self) -> Result<Vec<HostRecord>, StoreError>;

    /// Read one record by id outside any transaction.
    async fn select_by_id(&self, id: i64) -> Result<Option<HostRecord>, StoreError>;

    /// Open a transaction. Dropping the handle without committing must leave
    /// the store unchanged.
    async fn begin(&self) -> Result<Box<dyn HostTx>, StoreError>;
}

/// One open storage transaction. Reads observe earlier writes made through
/// the same handle.
#[async_trait]
pub trait HostTx: Send {
    async fn select_all(&mut self) -> Result<Vec<HostRecord>, StoreError>;

    async fn select_by_id(&mut self, id: i64) -> Result<Option<HostRecord>, StoreError>;

    /// Insert a record, assigning id and timestamps. Returns the stored row.
    async fn insert(&mut self, host: NewHost) -> Result<HostRecord, StoreError>;

    /// Overwrite an existing record (matched by `record.id`), refreshing
    /// `updated_at`.
    async fn update(&mut self, record: &HostRecord) -> Result<(), StoreError>;

    /// Delete a record. Returns whether a row existed.
    async fn delete(&mut self, id: i64) -> Result<bool, StoreError>;

    /// Re-insert a previously-read record verbatim, keeping its id and
    /// timestamps. Used for compensating undo of a delete.
    async fn restore(&mut self, record: &HostRecord) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
