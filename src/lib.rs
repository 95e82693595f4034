//! # ICY Streamer
//!
//! HTTP audio streaming with in-band ICY/SHOUTcast title metadata.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          HTTP LAYER (http)                            │
//! │   GET /stream   ── Icy-MetaData: 1 ? ──► icy-metaint: 20480           │
//! └───────────────────────────────┬──────────────────────────────────────┘
//!                                 │ one session per listener
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                     SESSION PUMP (session::pump)                      │
//! │   AudioSource ──read──► chunk ──write──► AudioSink                    │
//! └───────────────────────────────┬──────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                MetadataStream (icy::stream) [optional]                │
//! │                                                                      │
//! │   audio ... 20480 bytes ... │len│StreamTitle='..';│pad│ audio ...    │
//! │                             ▲                                        │
//! │                             └── TitleSource polled at each boundary  │
//! └───────────────────────────────┬──────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │          ChannelSink (icy::sink) ──mpsc──► HTTP response body         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod icy;
pub mod session;
pub mod title;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Bytes of audio payload between two metadata frames.
    ///
    /// Shared with the client through the `icy-metaint` response header.
    pub const ICY_METAINT: usize = 20480;

    /// Metadata payloads are sized in blocks of this many bytes
    pub const METADATA_BLOCK_SIZE: usize = 16;

    /// The block count is carried in a single byte
    pub const MAX_METADATA_BLOCKS: usize = u8::MAX as usize;

    /// Largest metadata payload that fits the length byte
    pub const MAX_METADATA_LEN: usize = METADATA_BLOCK_SIZE * MAX_METADATA_BLOCKS;

    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;

    /// Default read size when pumping a source into a listener
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    /// Default number of chunks buffered per listener before backpressure
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
}
