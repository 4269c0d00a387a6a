// Single-stream codec: one zlib stream per chunk.
//
// Each call allocates its own engine context and drops it before returning,
// so calls are independent and safe to run concurrently on distinct buffers.

use crate::engine::{EngineResult, zlib};
use crate::error::{CodecError, Result};
use crate::level::{DefaultLevel, ProcessDefault, resolve_level};

/// Compress `input` into `output` as a zlib stream.
///
/// `level < 0` selects the process-wide default level (see
/// [`crate::level::set_default_level`]). Returns the number of bytes written.
/// Size `output` with [`crate::bound::max_compressed_size`] to guarantee
/// success.
///
/// # Errors
///
/// [`CodecError::OutOfMemory`] if no compressor exists for the resolved
/// level or the stream does not fit in `output`.
pub fn compress(level: i32, input: &[u8], output: &mut [u8]) -> Result<usize> {
    compress_with(&ProcessDefault, level, input, output)
}

/// [`compress`] with an explicit source for the default level.
pub fn compress_with<D: DefaultLevel + ?Sized>(
    defaults: &D,
    level: i32,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    let level = resolve_level(level, defaults);
    let Some(compressor) = zlib::Compressor::new(level) else {
        log::debug!("no zlib compressor for level {level}");
        return Err(CodecError::OutOfMemory);
    };

    match compressor.compress(input, output) {
        0 => {
            log::debug!(
                "zlib stream for {} bytes does not fit in {} bytes",
                input.len(),
                output.len()
            );
            Err(CodecError::OutOfMemory)
        }
        written => {
            log::trace!("zlib level {level}: {} -> {written} bytes", input.len());
            Ok(written)
        }
    }
}

/// Decompress one zlib stream from `input` into `output`.
///
/// The whole of `input` must be consumed: a valid stream followed by any
/// trailing bytes is rejected. Returns the number of bytes written.
///
/// # Errors
///
/// [`CodecError::CorruptData`] if the stream is malformed, truncated, has
/// trailing bytes, or decompresses to more than `output.len()` bytes.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let decompressed = zlib::Decompressor::new().decompress_ex(input, output);

    if decompressed.result != EngineResult::Success {
        log::debug!("zlib decode failed: {:?}", decompressed.result);
        return Err(CodecError::CorruptData);
    }
    if decompressed.consumed != input.len() {
        log::debug!(
            "zlib stream ends after {} of {} input bytes",
            decompressed.consumed,
            input.len()
        );
        return Err(CodecError::CorruptData);
    }
    Ok(decompressed.produced)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::max_compressed_size;

    fn roundtrip(level: i32, data: &[u8]) -> usize {
        let mut compressed = vec![0u8; max_compressed_size(data.len())];
        let n = compress_with(&None::<i32>, level, data, &mut compressed).unwrap();
        let mut out = vec![0u8; data.len()];
        let m = decompress(&compressed[..n], &mut out).unwrap();
        assert_eq!(m, data.len());
        assert_eq!(&out[..m], data);
        n
    }

    #[test]
    fn roundtrip_text() {
        let data: Vec<u8> = b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .copied()
            .cycle()
            .take(8192)
            .collect();
        let n = roundtrip(6, &data);
        assert!(n < data.len() / 4);
    }

    #[test]
    fn roundtrip_all_levels() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        for level in 0..=9 {
            roundtrip(level, &data);
        }
    }

    #[test]
    fn negative_level_uses_default() {
        let data = vec![7u8; 1000];
        roundtrip(-1, &data);
        let mut out = vec![0u8; max_compressed_size(data.len())];
        assert!(compress_with(&Some(1i32), -1, &data, &mut out).is_ok());
    }

    #[test]
    fn unsupported_level_is_out_of_memory() {
        let mut out = vec![0u8; 256];
        assert_eq!(
            compress_with(&None::<i32>, 42, b"abc", &mut out),
            Err(CodecError::OutOfMemory)
        );
        // An invalid configured default is passed through, not clamped.
        assert_eq!(
            compress_with(&Some(12i32), -1, b"abc", &mut out),
            Err(CodecError::OutOfMemory)
        );
    }

    #[test]
    fn output_too_small_is_out_of_memory() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 7919 % 251) as u8).collect();
        let mut out = vec![0u8; 10];
        assert_eq!(
            compress_with(&None::<i32>, 6, &data, &mut out),
            Err(CodecError::OutOfMemory)
        );
    }

    #[test]
    fn empty_input_roundtrip() {
        let n = roundtrip(4, &[]);
        assert!(n > 0);
    }

    #[test]
    fn trailing_garbage_is_corrupt() {
        let data = vec![3u8; 500];
        let mut compressed = vec![0u8; max_compressed_size(data.len())];
        let n = compress(6, &data, &mut compressed).unwrap();
        let mut framed = compressed[..n].to_vec();
        framed.extend_from_slice(b"junk");

        let mut out = vec![0u8; data.len()];
        assert_eq!(decompress(&framed, &mut out), Err(CodecError::CorruptData));
    }

    #[test]
    fn short_output_is_corrupt() {
        let data = vec![9u8; 500];
        let mut compressed = vec![0u8; max_compressed_size(data.len())];
        let n = compress(6, &data, &mut compressed).unwrap();

        let mut out = vec![0u8; data.len() - 1];
        assert_eq!(
            decompress(&compressed[..n], &mut out),
            Err(CodecError::CorruptData)
        );
    }
}
