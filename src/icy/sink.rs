//! Byte sinks that audio can be streamed into
//!
//! `AudioSink` is `std::io::Write` plus an explicit `close`, so decorators
//! such as [`MetadataStream`](super::MetadataStream) can wrap any sink and
//! still be handed on as a sink themselves.

use bytes::Bytes;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use tokio::sync::mpsc;

/// Blocking byte sink with write, flush and close
pub trait AudioSink: Write {
    /// Release the sink. No further writes are accepted afterwards.
    fn close(&mut self) -> io::Result<()>;
}

impl AudioSink for Vec<u8> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AudioSink for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        self.shutdown(Shutdown::Write)
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Sink feeding an async HTTP response body through a bounded channel
///
/// Writes block while the channel is full, so it must be driven from a
/// blocking thread (e.g. `tokio::task::spawn_blocking`), never from
/// inside an async task.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<Bytes>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Create a sink together with the receiving end for the response body
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Whether the receiving side is still attached
    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "listener disconnected")
}

impl Write for ChannelSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let tx = self.tx.as_ref().ok_or_else(disconnected)?;
        tx.blocking_send(Bytes::copy_from_slice(buf))
            .map_err(|_| disconnected())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Every write is handed off immediately
        Ok(())
    }
}

impl AudioSink for ChannelSink {
    fn close(&mut self) -> io::Result<()> {
        // Dropping the sender ends the response body
        self.tx.take();
        Ok(())
    }
}
