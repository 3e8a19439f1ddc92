//! msgboard/crates/mb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the message board:
//! thread/reply documents, the read-side projections, the mutation service
//! and the storage port every plugin implements.

pub mod error;
pub mod models;
pub mod projection;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use service::{ThreadService, WriteConcern};
pub use traits::*;
