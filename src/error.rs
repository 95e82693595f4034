//! Error types for the streaming server

use std::io;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Metadata stream errors
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Stream is closed")]
    Closed,

    #[error("Downstream write failed: {0}")]
    Downstream(#[source] io::Error),
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, StreamError::Closed),
            StreamError::Downstream(inner) => inner,
        }
    }
}

/// Listener session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Session not found: {0}")]
    NotFound(uuid::Uuid),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
