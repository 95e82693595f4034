//! Stream title sources
//!
//! Titles are pulled, not pushed: the metadata stream asks its
//! [`TitleSource`] for the current title each time a metadata boundary
//! is crossed.

pub mod now_playing;

pub use now_playing::{NowPlaying, NowPlayingHandle};

use serde::{Deserialize, Serialize};

/// Polled for the display title at every metadata boundary
///
/// Implementations must return promptly; the audio stream waits on them.
pub trait TitleSource {
    /// Current display title, or `None` when nothing is known
    fn current_title(&self) -> Option<String>;
}

impl<F> TitleSource for F
where
    F: Fn() -> Option<String>,
{
    fn current_title(&self) -> Option<String> {
        self()
    }
}

/// Descriptive information about the track being streamed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TrackInfo {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: Some(artist.into()),
            title: Some(title.into()),
        }
    }

    /// Format as `"Artist - Title"`, falling back to whichever part is set
    pub fn display_title(&self) -> Option<String> {
        let artist = self.artist.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let title = self.title.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (artist, title) {
            (Some(artist), Some(title)) => Some(format!("{} - {}", artist, title)),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}
