//! A crate to re-export the tracing dependencies used for logging and
//! observability, so that all shardex crates agree on one version.
//!
//! Rather than having each crate depend on `tracing` directly (and
//! potentially drift to different versions), crates should depend on this
//! one and use `observability_deps::tracing::{debug, info, warn, error}`.

pub use tracing;
