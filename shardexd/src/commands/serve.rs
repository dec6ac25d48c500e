//! `shardexd serve`: the cooperative single-threaded server loop of spec §5.
//!
//! Grounded on `original_source/core/server.py::TCPServer.run`/`handle_echo`:
//! one task accepts connections, each accepted connection is handed to its
//! own task that reads exactly one framed request, dispatches it, writes the
//! response, and closes.

use crate::error::{self, Error};
use crate::handlers;
use clap::Parser;
use index_catalog::Catalog;
use index_store::IndexStore;
use kv_store::KvStore;
use metric::Registry as MetricRegistry;
use observability_deps::tracing::{debug, info, warn};
use snafu::ResultExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use wire_protocol::Dispatcher;

/// Serve queries (and the kv side-store) over the tag-delimited XML wire
/// protocol.
#[derive(Debug, Parser)]
pub struct Config {
    /// Root the index catalog is built from; enumerated once at startup.
    #[clap(long = "index-dir", env = "SHARDEX_INDEX_DIR")]
    index_dir: PathBuf,

    /// Host:port to accept connections on.
    #[clap(long = "bind", env = "SHARDEX_BIND", default_value = "127.0.0.1:7878")]
    bind: String,

    /// Default TTL, in seconds, for `kv_set` calls that don't specify one.
    #[clap(long = "kv-default-ttl-secs", default_value = "60")]
    kv_default_ttl_secs: u64,

    /// How often the kv side-store sweeps expired entries.
    #[clap(long = "kv-sweep-interval-secs", default_value = "30")]
    kv_sweep_interval_secs: u64,

    /// How long a connection may go without completing its request before
    /// it is dropped (spec §5: "Timeouts are enforced at the socket layer").
    #[clap(long = "read-timeout-secs", default_value = "10")]
    read_timeout_secs: u64,
}

pub async fn run(config: Config) -> Result<(), Error> {
    let store = IndexStore::local_filesystem(&config.index_dir).context(error::OpenStoreSnafu {
        path: config.index_dir.display().to_string(),
    })?;

    let metrics = MetricRegistry::new();
    let catalog = Arc::new(
        Catalog::build(store, "", &metrics)
            .await
            .context(error::LoadCatalogSnafu)?,
    );

    let kv = Arc::new(KvStore::new(Duration::from_secs(config.kv_default_ttl_secs)));
    tokio::spawn({
        let kv = Arc::clone(&kv);
        let period = Duration::from_secs(config.kv_sweep_interval_secs);
        async move {
            kv.run_expiration_loop(period).await;
        }
    });

    let mut dispatcher = Dispatcher::new();
    dispatcher.register("query", handlers::query_handler(Arc::clone(&catalog)));
    dispatcher.register("kv_get", handlers::kv_get_handler(Arc::clone(&kv)));
    dispatcher.register("kv_set", handlers::kv_set_handler(Arc::clone(&kv)));
    let dispatcher = Arc::new(dispatcher);

    let listener = TcpListener::bind(&config.bind)
        .await
        .context(error::BindSnafu {
            address: config.bind.clone(),
        })?;
    info!(address = %config.bind, "serving shardex");

    let read_timeout = Duration::from_secs(config.read_timeout_secs);
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(source) => {
                warn!(%source, "failed to accept connection");
                continue;
            }
        };

        let dispatcher = Arc::clone(&dispatcher);
        let registered_tags: Vec<String> = dispatcher
            .registered_tags()
            .into_iter()
            .map(str::to_string)
            .collect();

        tokio::spawn(async move {
            handle_connection(socket, peer, &dispatcher, &registered_tags, read_timeout).await;
        });
    }
}

async fn handle_connection(
    mut socket: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
    dispatcher: &Dispatcher,
    registered_tags: &[String],
    read_timeout: Duration,
) {
    let tags: Vec<&str> = registered_tags.iter().map(String::as_str).collect();

    let raw = match wire_protocol::read_framed_message(&mut socket, &tags, read_timeout).await {
        Ok(raw) => raw,
        Err(source) => {
            debug!(%peer, %source, "failed to read a complete request");
            return;
        }
    };

    let message = match wire_protocol::parse_message(&raw) {
        Ok(message) => message,
        Err(source) => {
            debug!(%peer, %source, "failed to parse request envelope");
            return;
        }
    };

    let response = match dispatcher.dispatch(message).await {
        Ok(response) => response,
        Err(source) => {
            observability_deps::tracing::error!(%peer, %source, "request dispatch failed");
            return;
        }
    };

    if let Err(source) = socket.write_all(response.as_bytes()).await {
        debug!(%peer, %source, "failed to write response");
    }
    let _ = socket.shutdown().await;
}
