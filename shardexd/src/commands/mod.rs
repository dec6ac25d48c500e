//! Subcommands: `build` populates an index store, `serve` answers queries
//! against one.

pub mod build;
pub mod serve;
