//! Axum web server

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::config::{AppConfig, StreamConfig};
use crate::error::Result;
use crate::session::{AudioSource, SessionRegistry};
use crate::title::NowPlaying;

/// Shared state for all handlers
pub struct AppState {
    pub stream: StreamConfig,
    pub source: Arc<dyn AudioSource>,
    pub now_playing: NowPlaying,
    pub sessions: SessionRegistry,
}

/// HTTP server serving one audio source to any number of listeners
pub struct WebServer {
    config: AppConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: AppConfig, source: Arc<dyn AudioSource>, now_playing: NowPlaying) -> Self {
        let state = Arc::new(AppState {
            stream: config.stream.clone(),
            source,
            now_playing,
            sessions: SessionRegistry::new(),
        });
        Self { config, state }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind and serve until the process exits
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(
            "Streaming {} on http://{}/stream",
            self.state.source.describe(),
            addr
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Serve on a background task
    pub fn start_background(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                tracing::error!("Web server error: {}", e);
            }
        })
    }
}

/// Build the router for `state`
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stream", get(handlers::stream_audio))
        .route("/api/status", get(handlers::get_status))
        .route("/api/sessions/:id", get(handlers::get_session))
        .route(
            "/api/now-playing",
            put(handlers::set_now_playing).delete(handlers::clear_now_playing),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
