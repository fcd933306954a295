use std::sync::Arc;

use async_trait::async_trait;
use form_spec::{FieldValue, FileHandle, Payload, Record, SubmissionAdapter, SubmissionError};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::crud::{CrudStore, Row};

/// Submits form payloads into a [`CrudStore`], uploading file values to a
/// [`BlobStore`] first and storing their public URLs in place of the files.
#[derive(Clone)]
pub struct StoreSubmissionAdapter {
    store: Arc<dyn CrudStore>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl StoreSubmissionAdapter {
    pub fn new(store: Arc<dyn CrudStore>) -> Self {
        Self { store, blobs: None }
    }

    pub fn with_blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    async fn upload(
        &self,
        table_name: &str,
        file: &FileHandle,
        uploaded: &mut Vec<String>,
    ) -> Result<Value, SubmissionError> {
        let blobs = self.blobs.as_ref().ok_or_else(|| {
            SubmissionError::new(format!(
                "cannot store file '{}': no file storage is configured",
                file.name
            ))
        })?;
        let path = format!("{table_name}/{}-{}", Uuid::new_v4(), file.name);
        blobs.upload(&path, file.bytes.clone()).await?;
        uploaded.push(path.clone());
        let url = blobs.public_url(&path)?;
        debug!(table = table_name, path = %path, "file uploaded");
        Ok(Value::String(url))
    }

    async fn to_row(
        &self,
        table_name: &str,
        payload: Payload,
        uploaded: &mut Vec<String>,
    ) -> Result<Row, SubmissionError> {
        let mut row = Row::new();
        for (column, value) in payload {
            let json = match &value {
                FieldValue::File(file) => self.upload(table_name, file, uploaded).await?,
                FieldValue::Files(files) => {
                    let mut urls = Vec::with_capacity(files.len());
                    for file in files {
                        urls.push(self.upload(table_name, file, uploaded).await?);
                    }
                    Value::Array(urls)
                }
                other => other.to_json(),
            };
            row.insert(column, json);
        }
        Ok(row)
    }

    async fn discard(&self, uploaded: &[String]) {
        let Some(blobs) = &self.blobs else {
            return;
        };
        for path in uploaded {
            if let Err(err) = blobs.remove(path).await {
                warn!(path = %path, error = %err, "failed to discard uploaded file");
            }
        }
    }
}

#[async_trait]
impl SubmissionAdapter for StoreSubmissionAdapter {
    async fn submit(
        &self,
        table_name: &str,
        payload: Payload,
        record_id: Option<&str>,
    ) -> Result<Record, SubmissionError> {
        let mut uploaded = Vec::new();
        let row = match self.to_row(table_name, payload, &mut uploaded).await {
            Ok(row) => row,
            Err(err) => {
                self.discard(&uploaded).await;
                return Err(err);
            }
        };

        let result = match record_id {
            Some(id) => self.store.update(table_name, id, row).await,
            None => self.store.insert(table_name, row).await,
        };
        match result {
            Ok(record) => {
                info!(table = table_name, record = ?record_id, files = uploaded.len(), "record saved");
                Ok(record)
            }
            Err(err) => {
                self.discard(&uploaded).await;
                Err(err.into())
            }
        }
    }
}
