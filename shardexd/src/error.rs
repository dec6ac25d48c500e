use snafu::Snafu;

/// Top-level error for the `shardexd` binary, composing each collaborating
/// crate's own `Error` type at the CLI/server boundary the way
/// `influxdb_iox`'s `main.rs` composes its subcommand errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to open index store at {path}: {source}"))]
    OpenStore {
        path: String,
        source: index_store::Error,
    },

    #[snafu(display("failed to load config file {path}: {source}"))]
    LoadConfig {
        path: String,
        source: build_pipeline::Error,
    },

    #[snafu(display("build pipeline failed: {source}"))]
    Build { source: build_pipeline::Error },

    #[snafu(display("failed to build the index catalog: {source}"))]
    LoadCatalog { source: index_catalog::Error },

    #[snafu(display("failed to bind {address}: {source}"))]
    Bind {
        address: String,
        source: std::io::Error,
    },
}
