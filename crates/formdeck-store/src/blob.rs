use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::error::BlobError;

/// Characters escaped in each path segment of a public URL.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object storage for uploaded files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), BlobError>;

    fn public_url(&self, path: &str) -> Result<String, BlobError>;

    async fn remove(&self, path: &str) -> Result<(), BlobError>;
}

/// Joins `path` onto `base`, percent-encoding every segment.
pub fn public_url(base: &Url, path: &str) -> Result<String, BlobError> {
    let segments = check_path(path)?;
    let encoded = segments
        .iter()
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&encoded)?.to_string())
}

/// Splits a relative blob path into segments, rejecting traversal.
pub(crate) fn check_path(path: &str) -> Result<Vec<&str>, BlobError> {
    let segments = path.split('/').collect::<Vec<_>>();
    let invalid = path.is_empty()
        || path.starts_with('/')
        || segments
            .iter()
            .any(|segment| segment.is_empty() || *segment == "." || *segment == ".." || segment.contains('\\'));
    if invalid {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}
