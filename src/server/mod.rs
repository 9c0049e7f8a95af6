//! HTTP server module
//!
//! The transport adapter: maps HTTP requests and responses onto
//! orchestrator calls. Owns CORS and the pass-through auth check; the
//! upload semantics live in [`crate::upload`].

use thiserror::Error;

pub mod http;

pub use http::Server;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("Failed to initialize storage client: {0}")]
    InitError(#[from] crate::s3::S3ClientError),

    #[error("Server error: {0}")]
    RuntimeError(String),
}
