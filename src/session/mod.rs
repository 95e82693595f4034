//! Listener sessions
//!
//! Each connected listener gets its own session: an entry in the
//! [`SessionRegistry`] and a blocking pump copying the audio source into
//! that listener's sink.

pub mod pump;
pub mod registry;
pub mod source;

pub use pump::pump;
pub use registry::{SessionGuard, SessionRegistry, SessionStatus};
pub use source::{AudioSource, FileSource};
