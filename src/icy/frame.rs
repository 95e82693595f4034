//! ICY metadata frame encoding
//!
//! A frame is one length byte holding the number of 16-byte blocks,
//! followed by the payload and zero padding up to `blocks * 16` bytes.
//! An unchanged title is signalled with a lone zero length byte.

use bytes::{BufMut, Bytes, BytesMut};
use std::io::{self, Write};

use crate::constants::{MAX_METADATA_LEN, METADATA_BLOCK_SIZE};

const TITLE_PREFIX: &str = "StreamTitle='";
const TITLE_SUFFIX: &str = "';";

/// Longest sanitized title that still fits a maximal frame
pub const MAX_TITLE_LEN: usize = MAX_METADATA_LEN - TITLE_PREFIX.len() - TITLE_SUFFIX.len();

/// Strip apostrophes, which delimit the title field and cannot be escaped
pub fn sanitize_title(title: &str) -> String {
    title.chars().filter(|&c| c != '\'').collect()
}

/// Cut `text` to at most `max_len` bytes on a character boundary
fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// A single in-band metadata frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFrame {
    payload: Bytes,
}

impl MetadataFrame {
    /// Frame telling the client that the title has not changed
    pub fn unchanged() -> Self {
        Self {
            payload: Bytes::new(),
        }
    }

    /// Frame announcing `title`
    ///
    /// Titles whose payload would exceed 255 blocks are truncated on a
    /// UTF-8 boundary; the closing `';` is always kept.
    pub fn announce(title: &str) -> Self {
        let sanitized = sanitize_title(title);
        let kept = truncate_on_char_boundary(&sanitized, MAX_TITLE_LEN);
        if kept.len() < sanitized.len() {
            tracing::debug!(
                "Truncated stream title from {} to {} bytes",
                sanitized.len(),
                kept.len()
            );
        }

        let mut payload =
            BytesMut::with_capacity(TITLE_PREFIX.len() + kept.len() + TITLE_SUFFIX.len());
        payload.put_slice(TITLE_PREFIX.as_bytes());
        payload.put_slice(kept.as_bytes());
        payload.put_slice(TITLE_SUFFIX.as_bytes());

        Self {
            payload: payload.freeze(),
        }
    }

    /// Payload bytes, without length byte or padding
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Value of the length byte
    pub fn blocks(&self) -> u8 {
        // announce() bounds the payload to MAX_METADATA_LEN
        self.payload.len().div_ceil(METADATA_BLOCK_SIZE) as u8
    }

    /// Zero bytes appended after the payload
    pub fn padding(&self) -> usize {
        self.blocks() as usize * METADATA_BLOCK_SIZE - self.payload.len()
    }

    /// Total bytes on the wire, including the length byte
    pub fn encoded_len(&self) -> usize {
        1 + self.blocks() as usize * METADATA_BLOCK_SIZE
    }

    /// Encode the frame into a contiguous buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.blocks());
        buf.put_slice(&self.payload);
        buf.put_bytes(0, self.padding());
        buf.freeze()
    }

    /// Write the encoded frame to `writer` in a single `write_all`
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}
