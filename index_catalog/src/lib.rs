//! The index catalog (spec §4.3): a path-trie of `[store, shard, column]`
//! keys, each holding either a placeholder pointing at an unread blob or the
//! already-materialized [`Filter`][filter_types::Filter].
//!
//! Source re-architecting note (spec Design Notes): "model as a sum type
//! `Unloaded(path) | Loaded(filter)` guarded by per-slot synchronization.
//! Concurrent readers race-initialize; the first loader installs, others
//! observe" — mirrors the check-lock-then-await-then-lock-again shape of
//! `cache_system::CacheDriver::get_with_status`.
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub use error::Error;

use filter_types::Filter;
use index_store::IndexStore;
use metric::{Registry, U64Counter};
use observability_deps::tracing::debug;
use parking_lot::Mutex;
use path_trie::Trie;
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;

#[derive(Debug)]
enum Slot {
    Placeholder { relative_path: String },
    Loaded(Arc<Filter>),
}

/// The catalog of every filter blob known to one deployment, keyed by
/// `[store, shard, column]`.
#[derive(Debug)]
pub struct Catalog {
    trie: Trie<String, Mutex<Slot>>,
    store: IndexStore,
    materializations: U64Counter,
}

impl Catalog {
    /// Walk `store` under `prefix` and register every path matching
    /// `<store>/<shard>/<column>.blob` as a placeholder. Works identically
    /// whether `store` is backed by a local filesystem or a remote blob
    /// store (spec §4.3: "two construction paths" differing only in which
    /// backend enumerates).
    pub async fn build(store: IndexStore, prefix: &str, metrics: &Registry) -> Result<Self, Error> {
        let paths = store
            .enumerate(prefix)
            .await
            .context(error::BackendUnavailableSnafu {
                prefix: prefix.to_string(),
            })?;

        let mut trie = Trie::new();
        for relative_path in paths {
            let key = match parse_blob_path(&relative_path) {
                Some(key) => key,
                None => continue,
            };
            trie.insert(
                &key,
                Mutex::new(Slot::Placeholder { relative_path }),
            );
        }

        Ok(Self {
            trie,
            store,
            materializations: metrics.register_counter("index_catalog_materializations"),
        })
    }

    /// Every registered `[store, shard, column]` key.
    pub fn keys(&self) -> Vec<Vec<String>> {
        self.trie.keys()
    }

    /// Keys whose first segment is `store` and whose third segment begins
    /// with `field` (spec §4.3 "prefix match, not equality", allowing one
    /// logical column to be indexed by several filter variants under
    /// suffixed names).
    pub fn find_shards(&self, store: &str, field: &str) -> Vec<Vec<String>> {
        self.keys()
            .into_iter()
            .filter(|key| {
                key.first().map(String::as_str) == Some(store)
                    && key.get(2).map_or(false, |c| c.starts_with(field))
            })
            .collect()
    }

    /// Materialize the filter at `key`, reading and deserializing its blob
    /// on first access and caching the result for subsequent calls
    /// (idempotent: a second concurrent materialization is wasted work, not
    /// a correctness bug, per spec §5).
    pub async fn materialize(&self, key: &[String]) -> Result<Arc<Filter>, Error> {
        let slot = self
            .trie
            .search(key)
            .context(error::NotIndexedSnafu { path: key.to_vec() })?;

        let relative_path = match &*slot.lock() {
            Slot::Loaded(filter) => return Ok(Arc::clone(filter)),
            Slot::Placeholder { relative_path } => relative_path.clone(),
        };

        let bytes = self
            .store
            .read(&relative_path)
            .await
            .context(error::FilterLoadFailedSnafu {
                relative_path: relative_path.clone(),
            })?;
        let filter = Arc::new(Filter::deserialize(&bytes).context(error::CorruptSnafu {
            relative_path: relative_path.clone(),
        })?);

        let mut guard = slot.lock();
        match &*guard {
            Slot::Loaded(existing) => Ok(Arc::clone(existing)),
            Slot::Placeholder { .. } => {
                *guard = Slot::Loaded(Arc::clone(&filter));
                self.materializations.inc();
                debug!(relative_path, "materialized filter blob");
                Ok(filter)
            }
        }
    }
}

/// Split `<store>/<shard>/<column>.blob` into `[store, shard, column]`.
/// Returns `None` for anything else (notably `stores_metadata/<store>.json`
/// manifests, which have two segments, not three).
fn parse_blob_path(relative_path: &str) -> Option<Vec<String>> {
    let segments: Vec<&str> = relative_path.split('/').collect();
    if segments.len() != 3 {
        return None;
    }
    let column = segments[2].strip_suffix(".blob")?;
    Some(vec![segments[0].to_string(), segments[1].to_string(), column.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use data_types::{ColumnChunk, Value};
    use filter_types::{BuildParams, Registry as FilterRegistry};

    async fn store_with_one_blob() -> (IndexStore, Registry) {
        let dir = std::env::temp_dir().join(format!(
            "index_catalog_test_{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let store = IndexStore::local_filesystem(&dir).unwrap();

        let chunk: ColumnChunk = vec![Some(Value::Categorical("active".to_string()))];
        let filter = FilterRegistry::new()
            .build("set", Box::new(std::iter::once(chunk)), &BuildParams::default())
            .unwrap();
        let bytes = filter.serialize().unwrap();
        store
            .write(&IndexStore::blob_path("sales", "shard-0", "status"), Bytes::from(bytes))
            .await
            .unwrap();
        (store, Registry::new())
    }

    #[tokio::test]
    async fn build_registers_placeholders_for_every_blob() {
        let (store, metrics) = store_with_one_blob().await;
        let catalog = Catalog::build(store, "sales", &metrics).await.unwrap();
        assert_eq!(
            catalog.keys(),
            vec![vec![
                "sales".to_string(),
                "shard-0".to_string(),
                "status".to_string()
            ]]
        );
    }

    #[tokio::test]
    async fn materialize_loads_and_caches() {
        let (store, metrics) = store_with_one_blob().await;
        let catalog = Catalog::build(store, "sales", &metrics).await.unwrap();
        let key = vec!["sales".to_string(), "shard-0".to_string(), "status".to_string()];

        let filter = catalog.materialize(&key).await.unwrap();
        assert!(filter.test(&Value::Categorical("active".to_string())).unwrap());

        catalog.materialize(&key).await.unwrap();
        assert_eq!(metrics.register_counter("index_catalog_materializations").get(), 1);
    }

    #[tokio::test]
    async fn find_shards_matches_field_prefix() {
        let (store, metrics) = store_with_one_blob().await;
        let catalog = Catalog::build(store, "sales", &metrics).await.unwrap();
        assert_eq!(catalog.find_shards("sales", "status").len(), 1);
        assert_eq!(catalog.find_shards("sales", "nonexistent").len(), 0);
        assert_eq!(catalog.find_shards("other_store", "status").len(), 0);
    }

    #[test]
    fn parses_a_well_formed_blob_path() {
        assert_eq!(
            parse_blob_path("sales/shard-0/status.blob"),
            Some(vec!["sales".to_string(), "shard-0".to_string(), "status".to_string()])
        );
    }

    #[test]
    fn rejects_the_manifest_path() {
        assert_eq!(parse_blob_path("stores_metadata/sales.json"), None);
    }
}
