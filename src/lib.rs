//! Reverse-proxy panel reconciliation engine.
//!
//! Transforms a declarative set of host records into a complete control-plane
//! configuration document, publishes it with bounded retry, and keeps the
//! record store and the running proxy server consistent by undoing mutations
//! whose publish step failed.

pub mod audit;
pub mod config;
pub mod control_plane;
pub mod document;
pub mod error;
pub mod reconcile;
pub mod resilience;
pub mod store;

pub use config::PanelConfig;
pub use control_plane::{ControlPlaneClient, Publisher};
pub use document::{build_document, ConfigDocument};
pub use error::{ControlPlaneError, PanelError};
pub use reconcile::Reconciler;
