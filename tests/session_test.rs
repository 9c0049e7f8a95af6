//! Upload session orchestrator tests
//!
//! Exercises the orchestrator against a mocked storage backend: key
//! namespacing, local validation short-circuits, and faithful forwarding
//! of backend outcomes.

use std::sync::Arc;

use mockall::predicate::eq;
use mockall::Sequence;
use partgate::s3::S3ClientError;
use partgate::upload::{PartDescriptor, StorageBackend, UploadError, UploadSessions};

mockall::mock! {
    pub Backend {}

    #[async_trait::async_trait]
    impl StorageBackend for Backend {
        async fn create_multipart_upload(&self, storage_key: &str) -> Result<String, S3ClientError>;
        async fn presign_upload_part(
            &self,
            storage_key: &str,
            upload_id: &str,
            part_number: i32,
        ) -> Result<String, S3ClientError>;
        async fn complete_multipart_upload(
            &self,
            storage_key: &str,
            upload_id: &str,
            parts: &[PartDescriptor],
        ) -> Result<(), S3ClientError>;
        async fn abort_multipart_upload(
            &self,
            storage_key: &str,
            upload_id: &str,
        ) -> Result<(), S3ClientError>;
    }
}

fn sessions(backend: MockBackend) -> UploadSessions {
    UploadSessions::new(Arc::new(backend), "blobs/incoming/")
}

#[tokio::test]
async fn test_start_applies_prefix_and_echoes_caller_key() {
    let mut backend = MockBackend::new();
    backend
        .expect_create_multipart_upload()
        .with(eq("blobs/incoming/movie.mp4"))
        .times(1)
        .returning(|_| Ok("U1".to_string()));

    let started = sessions(backend).start_upload("movie.mp4").await.unwrap();

    assert_eq!(started.upload_id, "U1");
    // The namespacing prefix must never leak into responses
    assert_eq!(started.key, "movie.mp4");
}

#[tokio::test]
async fn test_start_with_empty_key_never_reaches_backend() {
    // No expectations: any backend call panics the test
    let result = sessions(MockBackend::new()).start_upload("").await;
    assert!(matches!(result, Err(UploadError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_presign_forwards_parsed_part_number() {
    let mut backend = MockBackend::new();
    backend
        .expect_presign_upload_part()
        .with(eq("blobs/incoming/movie.mp4"), eq("U1"), eq(7))
        .times(1)
        .returning(|_, _, part| Ok(format!("https://signed.example/part/{}", part)));

    let url = sessions(backend)
        .presign_part("movie.mp4", "U1", "7")
        .await
        .unwrap();

    assert_eq!(url, "https://signed.example/part/7");
}

#[tokio::test]
async fn test_presigned_urls_differ_across_parts() {
    let mut backend = MockBackend::new();
    backend
        .expect_presign_upload_part()
        .times(2)
        .returning(|_, _, part| Ok(format!("https://signed.example/part/{}", part)));

    let s = sessions(backend);
    let url1 = s.presign_part("movie.mp4", "U1", "1").await.unwrap();
    let url2 = s.presign_part("movie.mp4", "U1", "2").await.unwrap();

    assert_ne!(url1, url2);
}

#[tokio::test]
async fn test_presign_invalid_inputs_never_reach_backend() {
    let s = sessions(MockBackend::new());

    for (key, upload_id, part) in [
        ("", "U1", "1"),
        ("movie.mp4", "", "1"),
        ("movie.mp4", "U1", "zero"),
        ("movie.mp4", "U1", "0"),
        ("movie.mp4", "U1", "-2"),
    ] {
        let result = s.presign_part(key, upload_id, part).await;
        assert!(matches!(result, Err(UploadError::InvalidRequest(_))));
    }
}

#[tokio::test]
async fn test_complete_forwards_manifest_verbatim() {
    // Non-contiguous manifest: the orchestrator must not second-guess it
    let manifest = vec![
        PartDescriptor {
            part_number: 1,
            etag: "\"E1\"".into(),
        },
        PartDescriptor {
            part_number: 3,
            etag: "\"E3\"".into(),
        },
    ];

    let expected = manifest.clone();
    let mut backend = MockBackend::new();
    backend
        .expect_complete_multipart_upload()
        .withf(move |key, upload_id, parts| {
            key == "blobs/incoming/movie.mp4" && upload_id == "U1" && parts == expected
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    sessions(backend)
        .complete_upload("movie.mp4", "U1", &manifest)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_backend_manifest_rejection_surfaces_unchanged() {
    let mut backend = MockBackend::new();
    backend
        .expect_complete_multipart_upload()
        .times(1)
        .returning(|_, _, _| {
            Err(S3ClientError::ManifestRejected(
                "InvalidPart: One or more of the specified parts could not be found".into(),
            ))
        });

    let err = sessions(backend)
        .complete_upload("movie.mp4", "U1", &[])
        .await
        .unwrap_err();

    match err {
        UploadError::Backend(inner) => {
            assert!(inner.to_string().contains("InvalidPart"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_double_abort_forwarded_faithfully() {
    let mut seq = Sequence::new();
    let mut backend = MockBackend::new();
    backend
        .expect_abort_multipart_upload()
        .with(eq("blobs/incoming/abort-me.bin"), eq("U2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    backend
        .expect_abort_multipart_upload()
        .with(eq("blobs/incoming/abort-me.bin"), eq("U2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| {
            Err(S3ClientError::UploadNotFound(
                "NoSuchUpload: The specified multipart upload does not exist".into(),
            ))
        });

    let s = sessions(backend);

    // First abort succeeds
    s.abort_upload("abort-me.bin", "U2").await.unwrap();

    // Second abort surfaces the backend's outcome, not a synthesized one
    let err = s.abort_upload("abort-me.bin", "U2").await.unwrap_err();
    assert!(err.to_string().contains("NoSuchUpload"));
}
