//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! UI action (create/update/delete/toggle)
//!     → begin storage transaction
//!     → mutate record(s)
//!     → read full host set (read-after-write)
//!     → secret normalization → document build → publish
//!     → success: audit + commit
//!     → failure: compensating undo + abort, typed error to caller
//! ```
//!
//! # Design Decisions
//! - The full host set is rebuilt on every mutation because global document
//!   fields derive from the union of all hosts
//! - No cross-operation serialization: concurrent operations may race to
//!   publish and the last one wins at the control plane

pub mod orchestrator;

pub use orchestrator::Reconciler;
