//! rf-core: stable foundation for reflow.
//!
//! Contains:
//! - ids (port and component identities that survive across graph versions)
//! - options (runtime configuration shared by a graph's components)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod options;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use options::*;
