//! HTTP handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::io;
use std::sync::Arc;

use crate::constants::ICY_METAINT;
use crate::error::SessionError;
use crate::http::server::AppState;
use crate::icy::headers::{metaint_value, wants_metadata, ICY_METAINT_HEADER};
use crate::icy::{ChannelSink, MetadataStream};
use crate::session::{pump, SessionStatus};
use crate::title::TrackInfo;

/// API response wrapper
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Stream audio to one listener
///
/// With `Icy-MetaData: 1` the body carries a metadata frame every
/// `ICY_METAINT` audio bytes and the response advertises the interval.
pub async fn stream_audio(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let metadata = wants_metadata(&headers);

    let source = match state.source.open() {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Cannot open audio source: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(e.to_string())),
            )
                .into_response();
        }
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let session = state.sessions.register(user_agent, metadata);

    let (sink, rx) = ChannelSink::channel(state.stream.channel_capacity);
    let chunk_size = state.stream.chunk_size;
    let titles = state.now_playing.title_source();

    tokio::task::spawn_blocking(move || {
        if metadata {
            pump(source, MetadataStream::new(sink, titles), chunk_size, &session)
        } else {
            pump(source, sink, chunk_size, &session)
        }
    });

    let chunks = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, io::Error>(chunk), rx))
    });

    let mut response = Response::new(Body::from_stream(chunks));
    let content_type = HeaderValue::from_str(&state.stream.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    if metadata {
        response
            .headers_mut()
            .insert(ICY_METAINT_HEADER.clone(), metaint_value());
    }
    response
}

/// Server status
#[derive(serde::Serialize)]
pub struct StreamStatus {
    pub now_playing: Option<TrackInfo>,
    pub title: Option<String>,
    pub metaint: usize,
    pub listeners: usize,
    pub sessions: Vec<SessionStatus>,
}

/// Get server status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StreamStatus>> {
    let sessions = state.sessions.statuses();
    let status = StreamStatus {
        now_playing: state.now_playing.current(),
        title: state.now_playing.display_title(),
        metaint: ICY_METAINT,
        listeners: sessions.len(),
        sessions,
    };

    Json(ApiResponse::ok(status))
}

/// Get one listener session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<uuid::Uuid>,
) -> (StatusCode, Json<ApiResponse<SessionStatus>>) {
    match state.sessions.get(id) {
        Ok(status) => (StatusCode::OK, Json(ApiResponse::ok(status))),
        Err(e @ SessionError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(ApiResponse::error(e.to_string())))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(e.to_string())),
        ),
    }
}

/// Set the now-playing track
pub async fn set_now_playing(
    State(state): State<Arc<AppState>>,
    Json(track): Json<TrackInfo>,
) -> Json<ApiResponse<Option<String>>> {
    let title = track.display_title();
    state.now_playing.set(track);
    Json(ApiResponse::ok(title))
}

/// Clear the now-playing track
pub async fn clear_now_playing(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    state.now_playing.clear();
    Json(ApiResponse::ok(()))
}
