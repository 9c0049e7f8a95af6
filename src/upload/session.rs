//! Upload session orchestrator
//!
//! Translates externally-visible requests into delegated-write operations:
//! request-shape validation, key namespacing, and error-surface
//! normalization. Holds no session table; each call is a stateless command
//! and sequencing correctness belongs to the caller and the backend.

use std::sync::Arc;

use super::{PartDescriptor, StorageBackend, UploadError};

/// Response to a start-upload request
///
/// Echoes the caller's logical key, never the namespaced storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedUpload {
    pub upload_id: String,
    pub key: String,
}

/// Upload session orchestrator
///
/// Constructed once at startup with an injected backend handle and shared
/// across request tasks. The conceptual session lifecycle
/// (`Created → Completed | Aborted`) is backend-enforced, not tracked here.
pub struct UploadSessions {
    backend: Arc<dyn StorageBackend>,
    key_prefix: String,
}

impl UploadSessions {
    /// Create a new orchestrator over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>, key_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            key_prefix: key_prefix.into(),
        }
    }

    /// Map a caller-supplied logical key to the namespaced storage key.
    ///
    /// Pure and deterministic: the same input always yields the same
    /// storage key. The prefix never appears in responses.
    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Start a new multipart upload session
    #[tracing::instrument(name = "upload.start", skip(self), err)]
    pub async fn start_upload(&self, key: &str) -> Result<StartedUpload, UploadError> {
        require_non_empty("key", key)?;

        let upload_id = self
            .backend
            .create_multipart_upload(&self.storage_key(key))
            .await?;

        Ok(StartedUpload {
            upload_id,
            key: key.to_string(),
        })
    }

    /// Issue a presigned upload URL for one part
    ///
    /// The part number arrives as the raw query-string value; it must parse
    /// as a positive integer before the backend is involved. Whether the
    /// upload session still exists is not checked here.
    #[tracing::instrument(name = "upload.presign", skip(self), err)]
    pub async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: &str,
    ) -> Result<String, UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;
        let part_number = parse_part_number(part_number)?;

        let url = self
            .backend
            .presign_upload_part(&self.storage_key(key), upload_id, part_number)
            .await?;

        Ok(url)
    }

    /// Complete an upload from the caller-submitted part manifest
    ///
    /// The manifest is forwarded verbatim; contiguity, duplicates, and ETag
    /// matches are validated by the backend, which is authoritative.
    #[tracing::instrument(name = "upload.complete", skip(self, parts), fields(parts_count = parts.len()), err)]
    pub async fn complete_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> Result<(), UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;

        self.backend
            .complete_multipart_upload(&self.storage_key(key), upload_id, parts)
            .await?;

        Ok(())
    }

    /// Abort an in-progress upload
    ///
    /// The backend's outcome is surfaced verbatim, including for an upload
    /// that was already aborted.
    #[tracing::instrument(name = "upload.abort", skip(self), err)]
    pub async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<(), UploadError> {
        require_non_empty("key", key)?;
        require_non_empty("uploadId", upload_id)?;

        self.backend
            .abort_multipart_upload(&self.storage_key(key), upload_id)
            .await?;

        Ok(())
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<(), UploadError> {
    if value.is_empty() {
        return Err(UploadError::InvalidRequest(format!("missing {}", name)));
    }
    Ok(())
}

fn parse_part_number(raw: &str) -> Result<i32, UploadError> {
    let n: i32 = raw
        .parse()
        .map_err(|_| UploadError::InvalidRequest(format!("invalid partNumber '{}'", raw)))?;
    if n < 1 {
        return Err(UploadError::InvalidRequest(format!(
            "invalid partNumber '{}': must be positive",
            raw
        )));
    }
    Ok(n)
}
