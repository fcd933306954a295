//! In-process backends for tests and dry runs.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;
use url::Url;

use crate::blob::{BlobStore, check_path, public_url};
use crate::crud::{self, CrudStore, Filter, Row};
use crate::error::{BlobError, StoreError};

/// Tables held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, Vec<Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrudStore for MemoryStore {
    async fn get(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Row>, StoreError> {
        crud::check_table(table)?;
        Ok(self
            .tables
            .get(table)
            .map(|rows| crud::select(&rows, filter))
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        crud::check_table(table)?;
        let mut rows = self.tables.entry(table.to_string()).or_default();
        let stored = crud::insert_row(table, &mut rows, row)?;
        debug!(table, "row inserted");
        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError> {
        crud::check_table(table)?;
        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::not_found(table, id))?;
        crud::update_row(table, &mut rows, id, patch)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        crud::check_table(table)?;
        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::not_found(table, id))?;
        crud::delete_row(table, &mut rows, id)
    }
}

/// Blobs held in memory, addressed under `base_url`.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: Url,
    blobs: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            blobs: DashMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<Bytes> {
        self.blobs.get(path).map(|bytes| bytes.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths = self
            .blobs
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), BlobError> {
        check_path(path)?;
        self.blobs.insert(path.to_string(), bytes);
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, BlobError> {
        public_url(&self.base_url, path)
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        self.blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }
}
