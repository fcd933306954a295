use std::sync::Arc;

use anyhow::{Context, Result};
use form_spec::FormDefinition;
use formdeck_store::{
    BlobStore, CrudStore, DocumentLibrary, FormRepository, FsBlobStore, FsStore,
    StoreSubmissionAdapter,
};
use tracing::debug;

use crate::config::Settings;

/// Stores and services opened for one command invocation.
pub struct App {
    pub settings: Settings,
    pub store: Arc<dyn CrudStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub forms: FormRepository,
}

impl App {
    pub fn open(settings: Settings) -> Result<Self> {
        std::fs::create_dir_all(&settings.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                settings.data_dir.display()
            )
        })?;
        debug!(
            data_dir = %settings.data_dir.display(),
            blob_dir = %settings.blob_dir.display(),
            "opening stores"
        );
        let store: Arc<dyn CrudStore> = Arc::new(FsStore::new(&settings.data_dir));
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(
            &settings.blob_dir,
            settings.public_base_url.clone(),
        ));
        Ok(Self {
            forms: FormRepository::new(store.clone()),
            settings,
            store,
            blobs,
        })
    }

    pub fn adapter(&self) -> StoreSubmissionAdapter {
        StoreSubmissionAdapter::new(self.store.clone()).with_blobs(self.blobs.clone())
    }

    pub fn documents(&self) -> DocumentLibrary {
        DocumentLibrary::new(self.store.clone(), self.blobs.clone())
    }

    pub async fn form(&self, id: &str) -> Result<FormDefinition> {
        self.forms
            .get(id)
            .await
            .with_context(|| format!("failed to load form '{id}'"))
    }
}
