//! Metadata-interleaving stream decorator
//!
//! Wraps a downstream [`AudioSink`] and injects a [`MetadataFrame`] after
//! every [`ICY_METAINT`] bytes of audio. Boundaries are counted on audio
//! bytes only; the audio itself is passed through untouched and in order.

use std::io::{self, Write};

use super::frame::MetadataFrame;
use super::sink::AudioSink;
use crate::constants::ICY_METAINT;
use crate::error::StreamError;
use crate::title::TitleSource;

/// Per-stream counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Audio payload bytes delivered downstream
    pub audio_bytes: u64,
    /// Metadata frames emitted, including unchanged-title frames
    pub metadata_frames: u64,
    /// Frames that carried a new title
    pub announcements: u64,
}

/// Audio sink decorator emitting ICY metadata frames at fixed intervals
///
/// One instance serves one listener and must only be driven by a single
/// writer.
pub struct MetadataStream<W, T> {
    downstream: W,
    titles: T,
    /// Audio bytes since the last boundary, always below `ICY_METAINT`
    bytes_since_boundary: usize,
    /// Last title sent in a non-empty frame, before sanitizing
    last_title: Option<String>,
    /// A downstream write failed; no further audio is accepted
    failed: bool,
    /// `close` was called
    closed: bool,
    stats: StreamStats,
}

impl<W: AudioSink, T: TitleSource> MetadataStream<W, T> {
    pub fn new(downstream: W, titles: T) -> Self {
        Self {
            downstream,
            titles,
            bytes_since_boundary: 0,
            last_title: None,
            failed: false,
            closed: false,
            stats: StreamStats::default(),
        }
    }

    /// Audio bytes still to go before the next metadata frame
    pub fn bytes_until_metadata(&self) -> usize {
        ICY_METAINT - self.bytes_since_boundary
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a downstream write failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn get_ref(&self) -> &W {
        &self.downstream
    }

    /// Poll the title source and build the frame for this boundary
    fn next_frame(&mut self) -> MetadataFrame {
        let title = self.titles.current_title().unwrap_or_default();

        if self.last_title.as_deref() == Some(title.as_str()) {
            return MetadataFrame::unchanged();
        }

        tracing::debug!("Announcing stream title: {}", title);
        let frame = MetadataFrame::announce(&title);
        self.last_title = Some(title);
        self.stats.announcements += 1;
        frame
    }

    fn emit_metadata(&mut self) -> io::Result<()> {
        let frame = self.next_frame();
        frame.write_to(&mut self.downstream)?;
        self.bytes_since_boundary = 0;
        self.stats.metadata_frames += 1;
        Ok(())
    }

    fn ensure_writable(&self) -> io::Result<()> {
        if self.closed || self.failed {
            return Err(StreamError::Closed.into());
        }
        Ok(())
    }

    /// Fail the session; nothing further is written after a downstream error
    fn poison(&mut self, err: io::Error) -> io::Error {
        let err = StreamError::Downstream(err);
        tracing::debug!("Metadata stream failed: {}", err);
        self.failed = true;
        err.into()
    }

    fn write_interleaved(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = buf.len().min(self.bytes_until_metadata());
            self.downstream.write_all(&buf[..n])?;
            buf = &buf[n..];
            self.bytes_since_boundary += n;
            self.stats.audio_bytes += n as u64;

            if self.bytes_since_boundary == ICY_METAINT {
                self.emit_metadata()?;
            }
        }
        Ok(())
    }
}

impl<W: AudioSink, T: TitleSource> Write for MetadataStream<W, T> {
    /// Consumes the whole buffer or fails; never reports a short write.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_writable()?;
        self.write_interleaved(buf).map_err(|e| self.poison(e))?;
        Ok(buf.len())
    }

    /// Delegates to the downstream sink, even after a failed write.
    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(StreamError::Closed.into());
        }
        self.downstream.flush()
    }
}

impl<W: AudioSink, T: TitleSource> AudioSink for MetadataStream<W, T> {
    /// Close the downstream sink, also after a failed write. No trailing
    /// metadata frame is written.
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.downstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::METADATA_BLOCK_SIZE;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Split interleaved output back into audio and raw frames (length byte included)
    fn demux(mut out: &[u8]) -> (Vec<u8>, Vec<Vec<u8>>) {
        let mut audio = Vec::new();
        let mut frames = Vec::new();
        loop {
            let n = out.len().min(ICY_METAINT);
            audio.extend_from_slice(&out[..n]);
            out = &out[n..];
            if out.is_empty() {
                break;
            }
            let len = 1 + out[0] as usize * METADATA_BLOCK_SIZE;
            frames.push(out[..len].to_vec());
            out = &out[len..];
        }
        (audio, frames)
    }

    /// Title source returning a settable title and counting polls
    #[derive(Clone)]
    struct CountingTitles {
        title: Rc<RefCell<Option<String>>>,
        polls: Rc<Cell<usize>>,
    }

    impl CountingTitles {
        fn new(title: Option<&str>) -> Self {
            Self {
                title: Rc::new(RefCell::new(title.map(str::to_string))),
                polls: Rc::new(Cell::new(0)),
            }
        }
    }

    impl TitleSource for CountingTitles {
        fn current_title(&self) -> Option<String> {
            self.polls.set(self.polls.get() + 1);
            self.title.borrow().clone()
        }
    }

    /// Sink that fails once `limit` bytes have been accepted
    struct FailingSink {
        written: Vec<u8>,
        limit: usize,
        closed: bool,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl AudioSink for FailingSink {
        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn audio(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn fixed(title: &'static str) -> impl Fn() -> Option<String> {
        move || Some(title.to_string())
    }

    #[test]
    fn test_short_write_emits_nothing() {
        let mut stream = MetadataStream::new(Vec::new(), fixed("T"));
        stream.write_all(&audio(100)).unwrap();
        assert_eq!(stream.get_ref().len(), 100);
        assert_eq!(stream.bytes_until_metadata(), ICY_METAINT - 100);
        assert_eq!(stream.stats().metadata_frames, 0);
    }

    #[test]
    fn test_zero_length_write() {
        let mut stream = MetadataStream::new(Vec::new(), fixed("T"));
        assert_eq!(stream.write(&[]).unwrap(), 0);
        assert!(stream.get_ref().is_empty());
    }

    #[test]
    fn test_first_frame_announces_title() {
        let mut stream = MetadataStream::new(Vec::new(), fixed("Artist - Track"));
        stream.write_all(&audio(ICY_METAINT)).unwrap();

        let out = stream.get_ref();
        let frame = &out[ICY_METAINT..];
        let payload = b"StreamTitle='Artist - Track';";
        assert_eq!(frame[0], 2);
        assert_eq!(frame.len(), 33);
        assert_eq!(&frame[1..1 + payload.len()], payload);
        assert!(frame[1 + payload.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unchanged_title_is_suppressed() {
        let mut stream = MetadataStream::new(Vec::new(), fixed("Same"));
        stream.write_all(&audio(ICY_METAINT * 3)).unwrap();

        let (_, frames) = demux(stream.get_ref());
        assert_eq!(frames.len(), 3);
        assert_ne!(frames[0], vec![0]);
        assert_eq!(frames[1], vec![0]);
        assert_eq!(frames[2], vec![0]);

        let stats = stream.stats();
        assert_eq!(stats.metadata_frames, 3);
        assert_eq!(stats.announcements, 1);
    }

    #[test]
    fn test_title_change_is_announced_again() {
        let titles = CountingTitles::new(Some("One"));
        let mut stream = MetadataStream::new(Vec::new(), titles.clone());
        stream.write_all(&audio(ICY_METAINT * 2)).unwrap();
        *titles.title.borrow_mut() = Some("Two".into());
        stream.write_all(&audio(ICY_METAINT)).unwrap();
        *titles.title.borrow_mut() = Some("One".into());
        stream.write_all(&audio(ICY_METAINT)).unwrap();

        let (_, frames) = demux(stream.get_ref());
        assert_eq!(frames.len(), 4);
        assert_eq!(&frames[0][1..19], b"StreamTitle='One';");
        assert_eq!(frames[1], vec![0]);
        assert_eq!(&frames[2][1..19], b"StreamTitle='Two';");
        assert_eq!(&frames[3][1..19], b"StreamTitle='One';");
    }

    #[test]
    fn test_one_poll_per_boundary() {
        let titles = CountingTitles::new(Some("x"));
        let mut stream = MetadataStream::new(Vec::new(), titles.clone());
        stream.write_all(&audio(ICY_METAINT - 1)).unwrap();
        assert_eq!(titles.polls.get(), 0);
        stream.write_all(&audio(ICY_METAINT + 2)).unwrap();
        assert_eq!(titles.polls.get(), 2);
    }

    #[test]
    fn test_missing_title_announces_empty_then_suppresses() {
        let titles = CountingTitles::new(None);
        let mut stream = MetadataStream::new(Vec::new(), titles);
        stream.write_all(&audio(ICY_METAINT * 2)).unwrap();

        let (_, frames) = demux(stream.get_ref());
        assert_eq!(frames[0][0], 1);
        assert_eq!(&frames[0][1..16], b"StreamTitle='';");
        assert_eq!(frames[1], vec![0]);
    }

    #[test]
    fn test_suppression_compares_unsanitized_title() {
        let titles = CountingTitles::new(Some("Dont"));
        let mut stream = MetadataStream::new(Vec::new(), titles.clone());
        stream.write_all(&audio(ICY_METAINT)).unwrap();
        // Sanitizes to the same text but differs as polled
        *titles.title.borrow_mut() = Some("Don't".into());
        stream.write_all(&audio(ICY_METAINT)).unwrap();

        let (_, frames) = demux(stream.get_ref());
        assert_eq!(frames[0], frames[1]);
        assert_eq!(stream.stats().announcements, 2);
    }

    #[test]
    fn test_exact_interval_writes() {
        let mut stream = MetadataStream::new(Vec::new(), fixed("T"));
        stream.write_all(&audio(ICY_METAINT)).unwrap();
        assert_eq!(stream.stats().metadata_frames, 1);
        assert_eq!(stream.bytes_until_metadata(), ICY_METAINT);

        stream.write_all(&audio(ICY_METAINT)).unwrap();
        assert_eq!(stream.stats().metadata_frames, 2);
        assert_eq!(stream.bytes_until_metadata(), ICY_METAINT);

        // Second frame sits at the very end of the output
        assert_eq!(*stream.get_ref().last().unwrap(), 0);
    }

    #[test]
    fn test_interval_plus_one() {
        let input = audio(ICY_METAINT + 1);
        let mut stream = MetadataStream::new(Vec::new(), fixed("T"));
        stream.write_all(&input).unwrap();

        let out = stream.get_ref();
        let frame_len = 1 + out[ICY_METAINT] as usize * METADATA_BLOCK_SIZE;
        assert_eq!(out.len(), ICY_METAINT + frame_len + 1);
        assert_eq!(out[out.len() - 1], input[ICY_METAINT]);
        assert_eq!(stream.stats().metadata_frames, 1);
        assert_eq!(stream.bytes_until_metadata(), ICY_METAINT - 1);
    }

    #[test]
    fn test_downstream_failure_is_fatal() {
        let sink = FailingSink {
            written: Vec::new(),
            limit: ICY_METAINT + 4,
            closed: false,
        };
        let mut stream = MetadataStream::new(sink, fixed("Long enough title"));
        let err = stream.write_all(&audio(ICY_METAINT * 2)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert!(stream.is_failed());
        assert!(!stream.is_closed());

        // Audio written before the failure stays written
        assert_eq!(stream.get_ref().written.len(), ICY_METAINT);

        let err = stream.write_all(&audio(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_close_after_failed_write_reaches_downstream() {
        let sink = FailingSink {
            written: Vec::new(),
            limit: 10,
            closed: false,
        };
        let mut stream = MetadataStream::new(sink, fixed("T"));
        assert!(stream.write_all(&[0u8; 100]).is_err());

        stream.close().unwrap();
        assert!(stream.get_ref().closed);
        assert!(stream.is_closed());
    }

    #[test]
    fn test_flush_after_failed_write_delegates() {
        let sink = FailingSink {
            written: Vec::new(),
            limit: 10,
            closed: false,
        };
        let mut stream = MetadataStream::new(sink, fixed("T"));
        assert!(stream.write_all(&[0u8; 100]).is_err());

        // FailingSink::flush always succeeds
        stream.flush().unwrap();
    }

    #[test]
    fn test_close_delegates_without_trailing_frame() {
        let sink = FailingSink {
            written: Vec::new(),
            limit: usize::MAX,
            closed: false,
        };
        let mut stream = MetadataStream::new(sink, fixed("T"));
        stream.write_all(&audio(ICY_METAINT - 1)).unwrap();
        stream.flush().unwrap();
        stream.close().unwrap();

        assert!(stream.get_ref().closed);
        assert_eq!(stream.get_ref().written.len(), ICY_METAINT - 1);
        assert!(stream.write_all(&audio(10)).is_err());
        assert!(stream.flush().is_err());
        // Closing twice is harmless
        stream.close().unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_audio_survives_arbitrary_splits(
            data in proptest::collection::vec(any::<u8>(), 0..ICY_METAINT * 3),
            cuts in proptest::collection::vec(0usize..ICY_METAINT * 3, 0..12),
        ) {
            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(data.len())).collect();
            cuts.sort_unstable();

            let mut stream = MetadataStream::new(Vec::new(), fixed("Prop"));
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(data.len())) {
                stream.write_all(&data[start..cut]).unwrap();
                start = cut;
            }

            let (recovered, frames) = demux(stream.get_ref());
            prop_assert_eq!(&recovered, &data);
            prop_assert_eq!(frames.len(), data.len() / ICY_METAINT);
            prop_assert_eq!(stream.stats().audio_bytes, data.len() as u64);
            prop_assert_eq!(stream.bytes_until_metadata(), ICY_METAINT - data.len() % ICY_METAINT);
        }

        #[test]
        fn prop_titles_change_at_every_boundary(
            titles in proptest::collection::vec(proptest::option::of("[ab' ]{0,3}|.{0,40}"), 1..6),
            chunk in 1usize..ICY_METAINT * 2,
            tail in 0usize..ICY_METAINT,
        ) {
            let polled = titles.clone();
            let next = Cell::new(0usize);
            let source = move || {
                let i = next.get();
                next.set(i + 1);
                polled.get(i).cloned().flatten()
            };

            let data = audio(titles.len() * ICY_METAINT + tail);
            let mut stream = MetadataStream::new(Vec::new(), source);
            for piece in data.chunks(chunk) {
                stream.write_all(piece).unwrap();
            }

            let (recovered, frames) = demux(stream.get_ref());
            prop_assert_eq!(&recovered, &data);
            prop_assert_eq!(frames.len(), titles.len());

            let mut last: Option<String> = None;
            for (frame, title) in frames.iter().zip(&titles) {
                let title = title.clone().unwrap_or_default();
                let expected = if last.as_deref() == Some(title.as_str()) {
                    MetadataFrame::unchanged()
                } else {
                    MetadataFrame::announce(&title)
                };
                let expected_bytes = expected.to_bytes();
                prop_assert_eq!(frame.as_slice(), expected_bytes.as_ref());
                prop_assert_eq!(frame.len(), 1 + frame[0] as usize * METADATA_BLOCK_SIZE);
                last = Some(title);
            }
        }
    }
}
