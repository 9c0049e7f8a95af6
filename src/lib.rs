//! Partgate Library
//!
//! Stateless presigned multipart-upload gateway for S3-compatible object
//! storage.
//!
//! # Design
//!
//! - **Delegated writes**: clients receive presigned part-upload URLs and
//!   transfer chunk bytes directly to the backend, out-of-band
//! - **Stateless**: no local session table; all upload truth lives in the
//!   storage backend, reached fresh on every call
//! - **Pass-through errors**: backend rejections surface verbatim, the
//!   gateway never infers or masks backend semantics
//!
//! # Example
//!
//! ```no_run
//! use partgate::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod router;
pub mod s3;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
