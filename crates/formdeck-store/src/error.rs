use std::path::PathBuf;

use form_spec::SubmissionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code reported when an insert collides with an existing `id`.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";
/// Code reported when a row addressed by `id` does not exist.
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Failure reported by a [`crate::CrudStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StoreError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn conflict(table: &str, id: &str) -> Self {
        Self::new(format!(
            "duplicate key value violates unique constraint \"{table}_pkey\""
        ))
        .with_code(UNIQUE_VIOLATION_CODE)
        .with_hint(format!("Key (id)=({id}) already exists."))
    }

    pub fn not_found(table: &str, id: &str) -> Self {
        Self::new(format!("no row with id '{id}' in {table}")).with_code(NOT_FOUND_CODE)
    }

    pub fn invalid_table(table: &str) -> Self {
        Self::new(format!("invalid table name '{table}'"))
            .with_hint("table names may only contain letters, digits and '_'")
    }

    pub fn is_conflict(&self) -> bool {
        self.code.as_deref() == Some(UNIQUE_VIOLATION_CODE)
    }

    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some(NOT_FOUND_CODE)
    }
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        SubmissionError {
            message: err.message,
            code: err.code,
            hint: err.hint,
        }
    }
}

/// Failure reported by a [`crate::BlobStore`].
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob path '{0}'")]
    InvalidPath(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid public url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<BlobError> for SubmissionError {
    fn from(err: BlobError) -> Self {
        SubmissionError::new(format!("file upload failed: {err}"))
    }
}
