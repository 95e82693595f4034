//! Blocking copy loop from an audio source into a listener sink

use std::io::{self, Read};

use super::registry::SessionGuard;
use crate::icy::AudioSink;

/// Copy `source` into `sink` until EOF, then close the sink.
///
/// Runs on a blocking thread, one per listener. A failed read or write
/// ends the session; a vanished listener is not treated as an error
/// worth more than a debug line. Returns the audio bytes delivered.
pub fn pump<R, S>(mut source: R, mut sink: S, chunk_size: usize, session: &SessionGuard) -> u64
where
    R: Read,
    S: AudioSink,
{
    let mut buffer = vec![0u8; chunk_size.max(1)];

    let outcome = loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(e),
        };

        if let Err(e) = sink.write_all(&buffer[..n]) {
            break Err(e);
        }
        session.record(n);
    };

    match outcome {
        Ok(()) => {
            tracing::debug!("Listener {} reached end of source", session.id());
            if let Err(e) = sink.flush() {
                tracing::debug!("Listener {} flush failed: {}", session.id(), e);
            }
        }
        Err(e) if is_disconnect(&e) => {
            tracing::debug!("Listener {} went away: {}", session.id(), e);
        }
        Err(e) => {
            tracing::warn!("Listener {} stream failed: {}", session.id(), e);
        }
    }

    if let Err(e) = sink.close() {
        tracing::debug!("Listener {} close failed: {}", session.id(), e);
    }

    session.audio_bytes()
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
    )
}
