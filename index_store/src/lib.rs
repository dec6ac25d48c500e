//! The storage-backend abstraction (spec §4.6): a uniform `enumerate` /
//! `read` / `write` capability set over whatever object store backs an
//! index — local filesystem for a single-node deployment, a remote blob
//! store (S3-compatible) for a shared one.
//!
//! `object_store` already abstracts the local-vs-remote distinction at the
//! byte level; this crate adds the `<store>/<shard>/<column>.blob` naming
//! discipline and the build-time-only write restriction called out in the
//! spec on top of it, the way `object_store_metrics` wraps the same trait
//! for metrics instead.
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub use error::Error;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{local::LocalFileSystem, DynObjectStore};
use snafu::ResultExt;
use std::sync::Arc;

/// A handle to the object store backing one deployment, plus the naming
/// convention used to address filter blobs and manifests within it.
#[derive(Debug, Clone)]
pub struct IndexStore {
    inner: Arc<DynObjectStore>,
}

impl IndexStore {
    /// Wrap an already-constructed `object_store` backend. Credentials for a
    /// remote backend are assumed to have been supplied out-of-band when
    /// `inner` was built (spec §4.6: "Credentials/authentication for the
    /// blob variant are provided out-of-band").
    pub fn new(inner: Arc<DynObjectStore>) -> Self {
        Self { inner }
    }

    /// A store rooted at a directory on the local filesystem.
    pub fn local_filesystem(root: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let fs = LocalFileSystem::new_with_prefix(root)
            .context(error::InitLocalSnafu {
                root: root.display().to_string(),
            })?;
        Ok(Self::new(Arc::new(fs)))
    }

    /// The canonical relative path for a shard's column blob:
    /// `<store>/<shard>/<column>.blob`.
    pub fn blob_path(store: &str, shard: &str, column: &str) -> String {
        format!("{store}/{shard}/{column}.blob")
    }

    /// The canonical relative path for a store's manifest:
    /// `stores_metadata/<store>.json`.
    pub fn manifest_path(store: &str) -> String {
        format!("stores_metadata/{store}.json")
    }

    /// List every relative path under `prefix`.
    pub async fn enumerate(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let object_prefix = ObjectPath::from(prefix);
        let metas = self
            .inner
            .list(Some(&object_prefix))
            .await
            .context(error::EnumerateSnafu {
                prefix: prefix.to_string(),
            })?
            .try_collect::<Vec<_>>()
            .await
            .context(error::EnumerateSnafu {
                prefix: prefix.to_string(),
            })?;
        Ok(metas.into_iter().map(|m| m.location.to_string()).collect())
    }

    /// Read the full contents of `relative_path`.
    pub async fn read(&self, relative_path: &str) -> Result<Bytes, Error> {
        let path = ObjectPath::from(relative_path);
        let result = self.inner.get(&path).await.context(error::ReadSnafu {
            path: relative_path.to_string(),
        })?;
        result.bytes().await.context(error::ReadSnafu {
            path: relative_path.to_string(),
        })
    }

    /// Write `bytes` to `relative_path`. Build-time only: the query path
    /// never calls this (spec §4.6).
    pub async fn write(&self, relative_path: &str, bytes: Bytes) -> Result<(), Error> {
        let path = ObjectPath::from(relative_path);
        self.inner
            .put(&path, bytes)
            .await
            .context(error::WriteSnafu {
                path: relative_path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bytes_through_a_local_store() {
        let dir = tempdir();
        let store = IndexStore::local_filesystem(&dir).unwrap();
        let path = IndexStore::blob_path("sales", "shard-0", "region");

        store
            .write(&path, Bytes::from_static(b"blob-bytes"))
            .await
            .unwrap();
        let bytes = store.read(&path).await.unwrap();
        assert_eq!(&bytes[..], b"blob-bytes");
    }

    #[tokio::test]
    async fn enumerate_lists_written_blobs() {
        let dir = tempdir();
        let store = IndexStore::local_filesystem(&dir).unwrap();
        store
            .write(
                &IndexStore::blob_path("sales", "shard-0", "region"),
                Bytes::from_static(b"a"),
            )
            .await
            .unwrap();
        store
            .write(
                &IndexStore::blob_path("sales", "shard-1", "region"),
                Bytes::from_static(b"b"),
            )
            .await
            .unwrap();

        let paths = store.enumerate("sales").await.unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[tokio::test]
    async fn reading_a_missing_path_fails() {
        let dir = tempdir();
        let store = IndexStore::local_filesystem(&dir).unwrap();
        let err = store.read("does/not/exist.blob").await.unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    fn tempdir() -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("index_store_test_{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
