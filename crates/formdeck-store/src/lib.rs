//! Persistence for formdeck: the CRUD and blob store seams, their memory and
//! filesystem backends, and the services built on top of them.

pub mod adapter;
pub mod blob;
pub mod crud;
pub mod defaults;
pub mod documents;
pub mod error;
#[cfg(feature = "fs")]
pub mod fs;
pub mod memory;
pub mod repository;

pub use adapter::StoreSubmissionAdapter;
pub use blob::{BlobStore, public_url};
pub use crud::{CrudStore, Filter, Row};
pub use defaults::default_forms;
pub use documents::{DOCUMENTS_TABLE, Document, DocumentError, DocumentLibrary};
pub use error::{BlobError, NOT_FOUND_CODE, StoreError, UNIQUE_VIOLATION_CODE};
#[cfg(feature = "fs")]
pub use fs::{FsBlobStore, FsStore};
pub use memory::{MemoryBlobStore, MemoryStore};
pub use repository::{FORM_DEFINITIONS_TABLE, FormRepository, RepositoryError};
