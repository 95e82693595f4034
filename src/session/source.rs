//! Audio byte sources
//!
//! Sources hand out already encoded audio; producing it (transcoding,
//! track selection) happens elsewhere.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Opens a fresh reader for every listener
pub trait AudioSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn Read + Send>, SessionError>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Encoded audio file on disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSource for FileSource {
    fn open(&self) -> Result<Box<dyn Read + Send>, SessionError> {
        let file = File::open(&self.path).map_err(|e| {
            SessionError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
