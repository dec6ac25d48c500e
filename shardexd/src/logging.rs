//! Startup logging configuration: a `logfmt` layer filtered by `RUST_LOG`
//! (teacher idiom: `logfmt` crate + `tracing-subscriber::EnvFilter`,
//! installed once from `main`).

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Safe to call once, at process
/// startup, before any other crate logs.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(logfmt::LogFmtLayer::new())
        .init();
}
