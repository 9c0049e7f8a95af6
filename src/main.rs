//! Partgate - Stateless presigned multipart-upload gateway
//!
//! Issues delegated write credentials for S3 multipart uploads; chunk bytes
//! never pass through this service.

use clap::Parser;
use partgate::{config::Config, server::Server};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Partgate - presigned multipart-upload gateway
#[derive(Parser, Debug)]
#[command(name = "partgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Partgate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration; missing credentials or bucket are fatal here
    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    // Start server
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
