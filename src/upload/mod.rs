//! Upload module
//!
//! Domain types and the upload-session orchestrator. All mutable upload
//! state lives in the storage backend; this layer is a stateless command
//! dispatcher on top of the [`StorageBackend`] seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::s3::S3ClientError;

pub mod session;

pub use session::{StartedUpload, UploadSessions};

/// Maximum part number accepted by S3-compatible backends.
///
/// The backend enforces this bound authoritatively; it is not re-checked
/// locally.
pub const MAX_PARTS: i32 = 10_000;

/// Upload orchestration errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Caller-supplied parameters failed local shape validation.
    /// Always a client error, never retried, never reaches the backend.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend-detected failure, surfaced unchanged.
    #[error(transparent)]
    Backend(#[from] S3ClientError),
}

/// One part of a completed-upload manifest
///
/// Produced by the backend when the caller uploads a chunk to a presigned
/// URL and round-tripped by the caller into the completion request. The
/// ETag is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDescriptor {
    pub part_number: i32,
    pub etag: String,
}

/// Storage backend seam for multipart-upload primitives
///
/// Implemented by the S3 client; mocked in orchestrator tests. Every
/// method is a single stateless command addressed by the fully-namespaced
/// storage key.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Allocate a new upload session, returning the backend-assigned id.
    async fn create_multipart_upload(&self, storage_key: &str) -> Result<String, S3ClientError>;

    /// Produce a time-limited, credential-embedding URL for one part.
    async fn presign_upload_part(
        &self,
        storage_key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String, S3ClientError>;

    /// Finalize the upload from the caller-submitted part manifest.
    async fn complete_multipart_upload(
        &self,
        storage_key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> Result<(), S3ClientError>;

    /// Discard an in-progress upload.
    async fn abort_multipart_upload(
        &self,
        storage_key: &str,
        upload_id: &str,
    ) -> Result<(), S3ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_descriptor_wire_shape() {
        let part: PartDescriptor =
            serde_json::from_str(r#"{"partNumber": 3, "etag": "\"abc123\""}"#).unwrap();
        assert_eq!(part.part_number, 3);
        assert_eq!(part.etag, "\"abc123\"");

        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"partNumber\":3"));
    }
}
