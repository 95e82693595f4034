//! ICY/SHOUTcast in-band metadata
//!
//! Frame encoding, the interleaving stream decorator, the sinks it
//! writes into, and the header handshake that turns it on.

pub mod frame;
pub mod headers;
pub mod sink;
pub mod stream;

pub use frame::MetadataFrame;
pub use sink::{AudioSink, ChannelSink};
pub use stream::{MetadataStream, StreamStats};
