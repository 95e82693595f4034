//! Application configuration
//!
//! Loaded from a TOML file. Every field has a default, so partial files
//! are fine. The metadata interval is a protocol constant and is not
//! configurable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_CHUNK_SIZE, DEFAULT_HTTP_PORT};
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Stream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Encoded audio file served on `/stream`
    pub source_path: Option<PathBuf>,
    /// `Content-Type` of the stream response
    pub content_type: String,
    /// Bytes read from the source per write
    pub chunk_size: usize,
    /// Chunks buffered per listener before the pump blocks
    pub channel_capacity: usize,
    /// Title announced before anything sets the now-playing track
    pub initial_title: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            source_path: None,
            content_type: "audio/mpeg".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            initial_title: None,
        }
    }
}

impl AppConfig {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "icy-streamer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream.chunk_size == 0 {
            return Err(Error::Config("stream.chunk_size must be non-zero".into()));
        }
        if self.stream.channel_capacity == 0 {
            return Err(Error::Config("stream.channel_capacity must be non-zero".into()));
        }
        Ok(())
    }

    /// Source file to serve; required before the server starts
    pub fn source_path(&self) -> Result<&Path> {
        self.stream
            .source_path
            .as_deref()
            .ok_or_else(|| Error::Config("stream.source_path is not set".into()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.http_port)
    }
}
