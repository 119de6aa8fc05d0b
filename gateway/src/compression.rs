//! Optional zlib-stream decompression of inbound frames.
//!
//! The Service can compress the entire gateway stream (as opposed to
//! per-message compression): each payload is a zlib block, and the stream as
//! a whole is one continuous deflate stream terminated, per payload, by the
//! four-byte suffix `00 00 ff ff`. Only complete payloads are handed back;
//! anything still buffered waiting on the suffix is kept for the next call.

use flate2::{Decompress, FlushDecompress, Status};
use std::time::Instant;

/// Zlib suffix marking the end of one payload within the stream.
const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// Size of the scratch buffer used per `decompress` call.
const INTERNAL_BUFFER_SIZE: usize = 32 * 1024;

/// How long a decompressor may go without the output buffer being fully
/// drained before that buffer is shrunk back down.
const IDLE_BUFFER_RESIZE_AFTER: std::time::Duration = std::time::Duration::from_secs(60);

/// Stateful zlib-stream inflater for one shard's connection.
///
/// Must be reset (via [`Inflater::reset`]) whenever the shard's connection
/// resets, since the deflate stream doesn't survive a reconnect.
#[derive(Debug)]
pub struct Inflater {
    decompress: Decompress,
    compressed: Vec<u8>,
    buffer: Vec<u8>,
    last_resize: Instant,
}

impl Inflater {
    /// Create a new, empty inflater.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decompress: Decompress::new(true),
            compressed: Vec::new(),
            buffer: Vec::new(),
            last_resize: Instant::now(),
        }
    }

    /// Feed `bytes` into the stream, returning the decompressed payload if
    /// the buffered data now ends on a complete message boundary.
    pub fn decompress(&mut self, bytes: &[u8]) -> Result<Option<&[u8]>, DecompressionError> {
        self.compressed.extend_from_slice(bytes);

        if self.compressed.len() < ZLIB_SUFFIX.len()
            || self.compressed[self.compressed.len() - ZLIB_SUFFIX.len()..] != ZLIB_SUFFIX
        {
            return Ok(None);
        }

        let mut internal_buffer = vec![0; INTERNAL_BUFFER_SIZE];
        let mut offset = 0;

        loop {
            let before_in = self.decompress.total_in();
            let before_out = self.decompress.total_out();

            let status = self
                .decompress
                .decompress(&self.compressed[offset..], &mut internal_buffer, FlushDecompress::Sync)
                .map_err(|source| DecompressionError { source })?;

            let consumed = (self.decompress.total_in() - before_in) as usize;
            let produced = (self.decompress.total_out() - before_out) as usize;

            self.buffer.extend_from_slice(&internal_buffer[..produced]);
            offset += consumed;

            if status == Status::StreamEnd || (consumed == 0 && produced == 0) {
                break;
            }
        }

        self.compressed.clear();
        self.maybe_shrink();

        Ok(Some(&self.buffer))
    }

    /// Clear the decompressed payload, retaining the buffer's capacity.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Reset the decompressor's state, for use after a reconnect.
    pub fn reset(&mut self) {
        self.decompress = Decompress::new(true);
        self.compressed.clear();
        self.buffer.clear();
    }

    fn maybe_shrink(&mut self) {
        if self.buffer.capacity() > INTERNAL_BUFFER_SIZE && self.last_resize.elapsed() > IDLE_BUFFER_RESIZE_AFTER {
            self.buffer.shrink_to(INTERNAL_BUFFER_SIZE);
            self.last_resize = Instant::now();
        }
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// A frame could not be decompressed.
#[derive(Debug)]
pub struct DecompressionError {
    source: flate2::DecompressError,
}

impl std::fmt::Display for DecompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("zlib stream could not be decompressed")
    }
}

impl std::error::Error for DecompressionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::Inflater;
    use flate2::{Compress, Compression, FlushCompress};

    /// Compress `payload` as the Service does: a zlib block ending in a sync
    /// flush, never finalized, so the stream can keep accepting payloads.
    fn compress(payload: &[u8]) -> Vec<u8> {
        let mut compress = Compress::new(Compression::default(), true);
        let mut out = vec![0; payload.len() + 1024];

        compress.compress(payload, &mut out, FlushCompress::Sync).unwrap();
        let produced = compress.total_out() as usize;
        out.truncate(produced);
        out
    }

    #[test]
    fn decompresses_a_single_payload() {
        let payload = br#"{"op":10,"d":{"heartbeat_interval":1}}"#;
        let compressed = compress(payload);

        let mut inflater = Inflater::new();
        let decompressed = inflater.decompress(&compressed).unwrap().unwrap().to_vec();
        assert_eq!(payload.to_vec(), decompressed);
    }

    #[test]
    fn buffers_until_the_suffix_arrives() {
        let payload = br#"{"op":11,"d":null}"#;
        let compressed = compress(payload);
        let (head, tail) = compressed.split_at(compressed.len() - 1);

        let mut inflater = Inflater::new();
        assert!(inflater.decompress(head).unwrap().is_none());
        assert!(inflater.decompress(tail).unwrap().is_some());
    }
}
