//! Document generation subsystem.
//!
//! # Data Flow
//! ```text
//! host records
//!     → fragments.rs (per-host advanced-config parsing)
//!     → builder.rs (one route per enabled host + global settings)
//!     → model.rs types (serialized by the publisher)
//! ```

pub mod builder;
pub mod fragments;
pub mod model;

pub use builder::build_document;
pub use fragments::parse_fragments;
pub use model::{ConfigDocument, Handler, MatchClause, Route};
