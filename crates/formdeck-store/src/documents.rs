use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::crud::{CrudStore, Filter, Row};
use crate::error::{BlobError, StoreError};

pub const DOCUMENTS_TABLE: &str = "documents";

/// Metadata row of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub path: String,
    pub url: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Hex SHA-256 of the content.
    #[serde(default)]
    pub checksum: String,
    pub uploaded_at: String,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document '{0}' not found")]
    NotFound(String),
    #[error("invalid document name '{0}'")]
    InvalidName(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("stored document row is malformed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Files kept in a blob store, indexed by rows of [`DOCUMENTS_TABLE`].
#[derive(Clone)]
pub struct DocumentLibrary {
    store: Arc<dyn CrudStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DocumentLibrary {
    pub fn new(store: Arc<dyn CrudStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Stores the blob, then its metadata row. The blob is removed again
    /// when the row cannot be written.
    pub async fn upload(
        &self,
        name: &str,
        content_type: Option<String>,
        bytes: Bytes,
    ) -> Result<Document, DocumentError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(DocumentError::InvalidName(name.to_string()));
        }
        let id = Uuid::new_v4().to_string();
        let path = format!("{DOCUMENTS_TABLE}/{id}-{name}");
        let document = Document {
            url: self.blobs.public_url(&path)?,
            id,
            name: name.to_string(),
            size: bytes.len() as u64,
            content_type,
            checksum: hex::encode(Sha256::digest(&bytes)),
            uploaded_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            path,
        };

        self.blobs.upload(&document.path, bytes).await?;
        let row = match serde_json::to_value(&document)? {
            Value::Object(row) => row,
            _ => Row::new(),
        };
        if let Err(err) = self.store.insert(DOCUMENTS_TABLE, row).await {
            warn!(document = %document.id, error = %err, "document row rejected, discarding blob");
            if let Err(cleanup) = self.blobs.remove(&document.path).await {
                warn!(path = %document.path, error = %cleanup, "failed to discard blob");
            }
            return Err(err.into());
        }
        info!(document = %document.id, name = %document.name, size = document.size, "document uploaded");
        Ok(document)
    }

    /// Documents, newest first.
    pub async fn list(&self) -> Result<Vec<Document>, DocumentError> {
        let rows = self.store.get(DOCUMENTS_TABLE, None).await?;
        let mut documents = rows
            .into_iter()
            .map(|row| serde_json::from_value::<Document>(Value::Object(row)))
            .collect::<Result<Vec<_>, _>>()?;
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents)
    }

    /// Deletes the blob, then the row. A blob that is already gone does not
    /// block removing the row.
    pub async fn remove(&self, id: &str) -> Result<Document, DocumentError> {
        let filter = Filter::eq("id", id);
        let row = self
            .store
            .get(DOCUMENTS_TABLE, Some(&filter))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        let document: Document = serde_json::from_value(Value::Object(row))?;

        match self.blobs.remove(&document.path).await {
            Ok(()) => {}
            Err(BlobError::NotFound(path)) => {
                warn!(document = id, path = %path, "document blob already missing");
            }
            Err(err) => return Err(err.into()),
        }
        self.store.delete(DOCUMENTS_TABLE, id).await?;
        info!(document = id, "document removed");
        Ok(document)
    }
}
