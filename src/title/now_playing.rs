//! Shared now-playing state
//!
//! The playback side owns a [`NowPlaying`] and updates it as tracks
//! change. Listener streams only get a [`NowPlayingHandle`], which does
//! not keep the state alive.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};

use super::{TitleSource, TrackInfo};

/// Currently playing track, shared between the player and the listeners
#[derive(Clone, Default)]
pub struct NowPlaying {
    inner: Arc<RwLock<Option<TrackInfo>>>,
}

impl NowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a plain display title
    pub fn with_title(title: impl Into<String>) -> Self {
        let now_playing = Self::new();
        now_playing.set(TrackInfo {
            artist: None,
            title: Some(title.into()),
        });
        now_playing
    }

    /// Replace the current track
    pub fn set(&self, track: TrackInfo) {
        tracing::info!("Now playing: {}", track.display_title().unwrap_or_default());
        *self.inner.write() = Some(track);
    }

    /// Forget the current track
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn current(&self) -> Option<TrackInfo> {
        self.inner.read().clone()
    }

    pub fn display_title(&self) -> Option<String> {
        self.inner.read().as_ref().and_then(TrackInfo::display_title)
    }

    /// Title source for a listener stream
    pub fn title_source(&self) -> NowPlayingHandle {
        NowPlayingHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak title source handed to each listener stream
#[derive(Clone)]
pub struct NowPlayingHandle {
    inner: Weak<RwLock<Option<TrackInfo>>>,
}

impl TitleSource for NowPlayingHandle {
    fn current_title(&self) -> Option<String> {
        let inner = self.inner.upgrade()?;
        let guard = inner.read();
        guard.as_ref().and_then(TrackInfo::display_title)
    }
}
