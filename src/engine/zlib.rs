// Single-stream zlib contexts.
//
// Output is a standard zlib stream (2-byte header, deflate body, Adler-32
// trailer) so any conforming zlib decoder can read it.

use flate2::{Compress, Decompress};

use super::{Decompressed, StreamEnd, compress_bounded, deflate_compress_bound, inflate_bounded};

/// zlib header (2 bytes) plus Adler-32 trailer (4 bytes).
pub const ZLIB_WRAPPER_LEN: usize = 6;

/// Worst-case size of a zlib stream holding `in_bytes` of input.
pub fn compress_bound(in_bytes: usize) -> usize {
    deflate_compress_bound(in_bytes).saturating_add(ZLIB_WRAPPER_LEN)
}

// ---------------------------------------------------------------------------
// Compressor
// ---------------------------------------------------------------------------

/// A zlib compressor context for one call.
pub struct Compressor {
    inner: Compress,
}

impl Compressor {
    /// Allocate a compressor for `level` (0-9). Returns `None` for levels the
    /// engine cannot configure.
    pub fn new(level: i32) -> Option<Self> {
        let level = super::engine_level(level)?;
        Some(Self {
            inner: Compress::new(level, true),
        })
    }

    /// Compress all of `input` into `output` as one zlib stream.
    ///
    /// Returns the number of bytes written, or 0 if the stream did not fit
    /// (or the engine failed). Consumes the context: one stream per context.
    pub fn compress(mut self, input: &[u8], output: &mut [u8]) -> usize {
        compress_bounded(&mut self.inner, input, output, StreamEnd::Finish).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Decompressor
// ---------------------------------------------------------------------------

/// A zlib decompressor context for one call.
pub struct Decompressor {
    inner: Decompress,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            inner: Decompress::new(true),
        }
    }

    /// Decompress one zlib stream from `input` into `output`.
    ///
    /// Stops at the end-of-stream marker; bytes after it are left
    /// unconsumed and show up as `consumed < input.len()`.
    pub fn decompress_ex(mut self, input: &[u8], output: &mut [u8]) -> Decompressed {
        let result = inflate_bounded(&mut self.inner, input, output, true);
        Decompressed {
            result,
            consumed: self.inner.total_in() as usize,
            produced: self.inner.total_out() as usize,
        }
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
