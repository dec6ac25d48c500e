//! `shardexd build`: run the build pipeline once over a data directory
//! (spec §6 "Configuration inputs for the build pipeline").

use crate::error::{self, Error};
use build_pipeline::Pipeline;
use clap::Parser;
use index_store::IndexStore;
use metric::Registry as MetricRegistry;
use observability_deps::tracing::info;
use snafu::ResultExt;
use std::collections::HashSet;
use std::path::PathBuf;

/// Build filter blobs and a manifest for every supported tabular file under
/// `data_dir`.
#[derive(Debug, Parser)]
pub struct Config {
    /// Root directory scanned for tabular files.
    #[clap(long = "data-dir", env = "SHARDEX_DATA_DIR")]
    data_dir: PathBuf,

    /// Logical store label assigned to every filter built in this
    /// invocation.
    #[clap(long = "store-name", env = "SHARDEX_STORE_NAME")]
    store_name: String,

    /// Root for emitted filter blobs and manifests.
    #[clap(long = "index-dir", env = "SHARDEX_INDEX_DIR")]
    index_dir: PathBuf,

    /// If non-empty, only these columns are indexed.
    #[clap(long = "included-columns", value_delimiter = ',')]
    included_columns: Vec<String>,

    /// Optional per-column strategy/param override file (JSON).
    #[clap(long = "config-file", env = "SHARDEX_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Strategy-selector cardinality cutoff below which a column gets a
    /// `bloom` filter.
    #[clap(long = "bloom-threshold", default_value = "10000")]
    bloom_threshold: usize,

    /// Strategy-selector cardinality cutoff below which a column gets a
    /// `set` filter.
    #[clap(long = "set-threshold", default_value = "1000")]
    set_threshold: usize,

    /// Rows pulled into memory per chunk by the tabular readers.
    #[clap(long = "chunk-size", default_value = "10000")]
    chunk_size: usize,
}

pub async fn run(config: Config) -> Result<(), Error> {
    let store = IndexStore::local_filesystem(&config.index_dir).context(error::OpenStoreSnafu {
        path: config.index_dir.display().to_string(),
    })?;

    let metrics = MetricRegistry::new();
    let mut pipeline = Pipeline::new(store, &config.store_name, &metrics)
        .with_thresholds(config.bloom_threshold, config.set_threshold)
        .with_chunk_size(config.chunk_size);

    if !config.included_columns.is_empty() {
        pipeline = pipeline.with_included_columns(
            config.included_columns.iter().cloned().collect::<HashSet<_>>(),
        );
    }

    if let Some(config_file) = &config.config_file {
        let overrides = build_pipeline::load_config(config_file).context(error::LoadConfigSnafu {
            path: config_file.display().to_string(),
        })?;
        pipeline = pipeline.with_config(overrides);
    }

    let manifest = pipeline
        .run(&config.data_dir)
        .await
        .context(error::BuildSnafu)?;

    info!(
        store = %config.store_name,
        columns = manifest.columns().count(),
        "build complete"
    );

    Ok(())
}
