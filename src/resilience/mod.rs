//! Resilience helpers for control-plane calls.
//!
//! # Design Decisions
//! - Every external call has a deadline (enforced by the client's request
//!   timeouts)
//! - Publish attempts retry with capped exponential backoff; status probes
//!   do not retry, they fall through to the next candidate endpoint

pub mod backoff;
pub mod retry;

pub use retry::{retry_with_backoff, RetryPolicy};
