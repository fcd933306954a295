//! Filesystem backends: one JSON array per table, one file per blob.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::blob::{BlobStore, check_path, public_url};
use crate::crud::{self, CrudStore, Filter, Row};
use crate::error::{BlobError, StoreError};

/// Stores each table as `<root>/<table>.json`.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        crud::check_table(table)?;
        Ok(self.root.join(format!("{table}.json")))
    }

    async fn load(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let path = self.table_path(table)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&path, err)),
        };
        serde_json::from_slice(&raw).map_err(|err| {
            StoreError::new(format!("table file {} is corrupt: {err}", path.display()))
        })
    }

    async fn persist(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| io_error(&self.root, err))?;
        let raw = serde_json::to_vec_pretty(rows)
            .map_err(|err| StoreError::new(format!("failed to encode {table}: {err}")))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|err| io_error(&tmp, err))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| io_error(&path, err))?;
        debug!(table, rows = rows.len(), "table persisted");
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    warn!(path = %path.display(), error = %err, "store io failure");
    StoreError::new(format!("failed to access {}: {err}", path.display()))
}

#[async_trait]
impl CrudStore for FsStore {
    async fn get(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Row>, StoreError> {
        let rows = self.load(table).await?;
        Ok(crud::select(&rows, filter))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load(table).await?;
        let stored = crud::insert_row(table, &mut rows, row)?;
        self.persist(table, &rows).await?;
        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load(table).await?;
        let updated = crud::update_row(table, &mut rows, id, patch)?;
        self.persist(table, &rows).await?;
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load(table).await?;
        crud::delete_row(table, &mut rows, id)?;
        self.persist(table, &rows).await
    }
}

/// Stores blobs under `root`, served from `base_url`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: Url,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: Url) -> Self {
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn blob_path(&self, path: &str) -> Result<PathBuf, BlobError> {
        let segments = check_path(path)?;
        Ok(segments
            .into_iter()
            .fold(self.root.clone(), |dir, segment| dir.join(segment)))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), BlobError> {
        let target = self.blob_path(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BlobError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|source| BlobError::Io {
                path: target.clone(),
                source,
            })?;
        debug!(path, size = bytes.len(), "blob written");
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, BlobError> {
        public_url(&self.base_url, path)
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let target = self.blob_path(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(source) => Err(BlobError::Io {
                path: target,
                source,
            }),
        }
    }
}
