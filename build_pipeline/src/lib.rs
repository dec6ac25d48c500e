//! The build pipeline (spec §4.4): walks a data directory, chooses a filter
//! strategy per column, builds and serializes each filter, and writes a
//! per-store manifest.
//!
//! Source re-architecting note (spec Design Notes): the Python prototype's
//! `AbstractFilterGenerator` is an `ABC` subclassed per tabular format
//! (`ParquetFilterGenerator`, `CSVFilterGenerator`); here the format split
//! already lives inside [`tabular::TabularFile`], so one [`Pipeline`] walks
//! every supported extension uniformly.
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod selector;

pub use config::{load as load_config, Config, ColumnOverride};
pub use error::Error;

use bytes::Bytes;
use filter_types::Registry as FilterRegistry;
use index_store::IndexStore;
use metric::{Registry as MetricRegistry, U64Counter};
use observability_deps::tracing::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tabular::TabularFile;
use walkdir::WalkDir;

/// One column's recorded outcome in a store's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The filter tag that was built for this column.
    pub filter_type: String,
    /// Path to the blob, relative to the index root.
    pub relative_path: String,
}

/// `column name → outcome`, written once at the end of a [`Pipeline::run`]
/// (spec §4.4 step 7). Mirrors `AbstractFilterGenerator.generate_filters`'s
/// `metadata` dict, including its behavior of keeping only the most recently
/// processed shard's entry per column name — the manifest is a descriptive
/// summary, not the source of truth for what the index catalog enumerates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest(HashMap<String, ManifestEntry>);

impl Manifest {
    /// The recorded outcome for `column`, if any file defined one.
    pub fn get(&self, column: &str) -> Option<&ManifestEntry> {
        self.0.get(column)
    }

    /// Every column name the manifest has an entry for.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Builds and populates an [`IndexStore`] from a directory of tabular files.
#[derive(Debug)]
pub struct Pipeline {
    store: IndexStore,
    store_name: String,
    config: Config,
    included_columns: Option<HashSet<String>>,
    bloom_threshold: usize,
    set_threshold: usize,
    chunk_size: usize,
    registry: FilterRegistry,
    files_processed: U64Counter,
    columns_indexed: U64Counter,
}

impl Pipeline {
    /// A pipeline with no configured overrides, no column inclusion filter,
    /// and the default strategy-selector thresholds and chunk size.
    pub fn new(store: IndexStore, store_name: impl Into<String>, metrics: &MetricRegistry) -> Self {
        Self {
            store,
            store_name: store_name.into(),
            config: Config::default(),
            included_columns: None,
            bloom_threshold: selector::BLOOM_THRESHOLD,
            set_threshold: selector::SET_THRESHOLD,
            chunk_size: tabular::DEFAULT_CHUNK_SIZE,
            registry: FilterRegistry::new(),
            files_processed: metrics.register_counter("build_pipeline_files_processed"),
            columns_indexed: metrics.register_counter("build_pipeline_columns_indexed"),
        }
    }

    /// Apply per-column strategy overrides, bypassing the selector for any
    /// column named in `config` (spec §4.4 step 3a).
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Restrict indexing to `columns`; every other column in a file is
    /// skipped. An empty set is treated the same as `None` (index every
    /// column), matching `df.columns` falling back when
    /// `included_columns` is empty in the source prototype.
    pub fn with_included_columns(mut self, columns: HashSet<String>) -> Self {
        self.included_columns = Some(columns);
        self
    }

    /// Override the strategy selector's cardinality cutoffs.
    pub fn with_thresholds(mut self, bloom_threshold: usize, set_threshold: usize) -> Self {
        self.bloom_threshold = bloom_threshold;
        self.set_threshold = set_threshold;
        self
    }

    /// Override the number of rows pulled into memory per chunk, used by
    /// both the selector sample pass and the build pass (spec §6
    /// `DEFAULT_CHUNK_SIZE`).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Walk `data_dir`, build every in-scope column's filter, and write the
    /// resulting manifest (spec §4.4 steps 1-7).
    pub async fn run(&self, data_dir: &Path) -> Result<Manifest, Error> {
        let mut manifest = HashMap::new();

        for entry in WalkDir::new(data_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| tabular::SUPPORTED_EXTENSIONS.contains(&ext));
            if !supported {
                continue;
            }

            self.index_file(path, &mut manifest).await?;
        }

        let manifest = Manifest(manifest);
        self.write_manifest(&manifest).await?;
        Ok(manifest)
    }

    async fn index_file(
        &self,
        path: &Path,
        manifest: &mut HashMap<String, ManifestEntry>,
    ) -> Result<(), Error> {
        let display = path.display().to_string();
        let file = TabularFile::open(path).context(error::OpenSnafu {
            path: display.clone(),
        })?;

        if file.is_empty().context(error::OpenSnafu {
            path: display.clone(),
        })? {
            debug!(path = %display, "skipping empty file");
            return Ok(());
        }

        let shard = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("shard")
            .to_string();

        let columns: Vec<String> = match &self.included_columns {
            Some(included) if !included.is_empty() => file
                .columns()
                .iter()
                .filter(|column| included.contains(*column))
                .cloned()
                .collect(),
            _ => file.columns().to_vec(),
        };

        for column in columns {
            self.index_column(&file, &display, &shard, &column, manifest)
                .await?;
        }

        self.files_processed.inc();
        Ok(())
    }

    async fn index_column(
        &self,
        file: &TabularFile,
        display: &str,
        shard: &str,
        column: &str,
        manifest: &mut HashMap<String, ManifestEntry>,
    ) -> Result<(), Error> {
        let strategy = match self.config.get(column) {
            Some(over) => {
                ensure!(
                    self.registry.contains(&over.strategy),
                    error::UnknownStrategySnafu {
                        path: display.to_string(),
                        column: column.to_string(),
                        strategy: over.strategy.clone(),
                    }
                );
                over.strategy.clone()
            }
            None => {
                let sample = file
                    .chunks(column, self.chunk_size)
                    .context(error::SampleSnafu {
                        path: display.to_string(),
                        column: column.to_string(),
                    })?;
                selector::select_strategy(
                    sample,
                    self.bloom_threshold,
                    self.set_threshold,
                    display,
                    column,
                )?
                .to_string()
            }
        };

        let params = self
            .config
            .get(column)
            .map(|over| over.params.clone())
            .unwrap_or_default();

        // Independent pass: the selector's reader (if any) is exhausted.
        let build_chunks = file
            .chunks(column, self.chunk_size)
            .context(error::ReadSnafu {
                path: display.to_string(),
                column: column.to_string(),
            })?;

        let filter = self
            .registry
            .build(&strategy, build_chunks, &params)
            .context(error::BuildSnafu {
                path: display.to_string(),
                column: column.to_string(),
                strategy: strategy.clone(),
            })?;

        let bytes = filter.serialize().context(error::SerializeSnafu {
            path: display.to_string(),
            column: column.to_string(),
        })?;

        let relative_path = IndexStore::blob_path(&self.store_name, shard, column);
        self.store
            .write(&relative_path, Bytes::from(bytes))
            .await
            .context(error::WriteBlobSnafu {
                path: display.to_string(),
                column: column.to_string(),
            })?;

        info!(path = %relative_path, strategy = %strategy, "wrote filter blob");
        self.columns_indexed.inc();
        manifest.insert(
            column.to_string(),
            ManifestEntry {
                filter_type: strategy,
                relative_path,
            },
        );
        Ok(())
    }

    async fn write_manifest(&self, manifest: &Manifest) -> Result<(), Error> {
        let bytes = serde_json::to_vec(manifest).context(error::SerializeManifestSnafu {
            store: self.store_name.clone(),
        })?;
        self.store
            .write(&IndexStore::manifest_path(&self.store_name), Bytes::from(bytes))
            .await
            .context(error::WriteManifestSnafu {
                store: self.store_name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_types::BuildParams;
    use std::io::Write;

    fn registry() -> MetricRegistry {
        MetricRegistry::new()
    }

    fn store(dir: &Path) -> IndexStore {
        std::fs::create_dir_all(dir).unwrap();
        IndexStore::local_filesystem(dir).unwrap()
    }

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "build_pipeline_test_{name}_{:?}",
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn builds_and_writes_a_manifest_for_a_csv_directory() {
        let data_dir = scratch("data");
        let mut file = std::fs::File::create(data_dir.join("accounts.csv")).unwrap();
        writeln!(file, "status").unwrap();
        for _ in 0..5 {
            writeln!(file, "active").unwrap();
        }

        let index_dir = scratch("index");
        let metrics = registry();
        let pipeline = Pipeline::new(store(&index_dir), "s", &metrics);

        let manifest = pipeline.run(&data_dir).await.unwrap();
        let entry = manifest.get("status").unwrap();
        assert_eq!(entry.filter_type, "bloom");
        assert_eq!(entry.relative_path, "s/accounts/status.blob");

        let raw = pipeline
            .store
            .read(&IndexStore::manifest_path("s"))
            .await
            .unwrap();
        let roundtrip: Manifest = serde_json::from_slice(&raw).unwrap();
        assert_eq!(roundtrip.get("status").unwrap().filter_type, "bloom");
    }

    #[tokio::test]
    async fn empty_file_is_skipped() {
        let data_dir = scratch("empty_data");
        std::fs::File::create(data_dir.join("empty.csv")).unwrap();

        let index_dir = scratch("empty_index");
        let metrics = registry();
        let pipeline = Pipeline::new(store(&index_dir), "s", &metrics);

        let manifest = pipeline.run(&data_dir).await.unwrap();
        assert_eq!(manifest.columns().count(), 0);
    }

    #[tokio::test]
    async fn config_override_bypasses_the_selector() {
        let data_dir = scratch("override_data");
        let mut file = std::fs::File::create(data_dir.join("ledger.csv")).unwrap();
        writeln!(file, "amount").unwrap();
        for v in 0..5 {
            writeln!(file, "{v}").unwrap();
        }

        let mut config = Config::default();
        config.insert(
            "amount".to_string(),
            ColumnOverride {
                strategy: "range".to_string(),
                params: BuildParams::default(),
            },
        );

        let index_dir = scratch("override_index");
        let metrics = registry();
        let pipeline = Pipeline::new(store(&index_dir), "s", &metrics).with_config(config);

        let manifest = pipeline.run(&data_dir).await.unwrap();
        assert_eq!(manifest.get("amount").unwrap().filter_type, "range");
    }

    #[tokio::test]
    async fn unknown_override_strategy_fails() {
        let data_dir = scratch("bad_override_data");
        let mut file = std::fs::File::create(data_dir.join("x.csv")).unwrap();
        writeln!(file, "a").unwrap();
        writeln!(file, "1").unwrap();

        let mut config = Config::default();
        config.insert(
            "a".to_string(),
            ColumnOverride {
                strategy: "not-a-real-strategy".to_string(),
                params: BuildParams::default(),
            },
        );

        let index_dir = scratch("bad_override_index");
        let metrics = registry();
        let pipeline = Pipeline::new(store(&index_dir), "s", &metrics).with_config(config);

        let err = pipeline.run(&data_dir).await.unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy { .. }));
    }
}
