//! ICY Stream Server
//!
//! Serves an encoded audio file over HTTP, with in-band title metadata
//! for clients that ask for it.
//!
//! Usage: `icy-serve [CONFIG_PATH]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use icy_streamer::{
    config::AppConfig, constants::ICY_METAINT, http::WebServer, session::FileSource,
    title::NowPlaying,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ICY stream server");

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load_or_default().context("Failed to load default config")?,
    };

    let source_path = config.source_path()?.to_path_buf();
    let source = Arc::new(FileSource::new(source_path));

    let now_playing = match &config.stream.initial_title {
        Some(title) => NowPlaying::with_title(title.clone()),
        None => NowPlaying::new(),
    };

    tracing::info!(
        "Metadata interval {} bytes, chunk size {} bytes",
        ICY_METAINT,
        config.stream.chunk_size
    );

    WebServer::new(config, source, now_playing).run().await?;
    Ok(())
}
