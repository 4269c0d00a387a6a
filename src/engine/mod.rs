// Deflate engine collaborator.
//
// Thin, allocation-per-context wrappers over flate2 exposing the shape the
// codec layer consumes:
//
// - `zlib`:     single-stream zlib (RFC 1950) compressor/decompressor
// - `gdeflate`: page-split raw deflate with independently decodable pages
//
// Every context is created for one call and released on drop. Operations
// write into caller-provided, capacity-bounded buffers and report byte counts
// instead of growing a Vec.

pub mod gdeflate;
pub mod zlib;

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::level::MAX_ZIP_LEVEL;

/// Outcome of a decompression call, mirroring the result codes of common
/// deflate libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineResult {
    Success,
    /// The compressed stream is malformed.
    BadData,
    /// The compressed stream ended before the end-of-stream marker.
    ShortOutput,
    /// The output buffer filled up before the stream was fully decoded.
    InsufficientSpace,
}

/// Result of a decompression call: status plus byte accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decompressed {
    pub result: EngineResult,
    /// Compressed bytes consumed from the input.
    pub consumed: usize,
    /// Decompressed bytes written to the output.
    pub produced: usize,
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Bytes per stored block header (3 header bits padded, LEN, NLEN).
const STORED_BLOCK_OVERHEAD: usize = 5;

/// Input covered by one stored-block header in the worst case.
const STORED_BLOCK_SPAN: usize = 16_383;

/// Block header, end-of-block code, padding and a trailing flush marker.
const STREAM_OVERHEAD: usize = 10;

/// Worst-case size of a raw deflate stream holding `in_bytes` of input.
///
/// Covers static-Huffman expansion (9-bit literals), stored-block fallback
/// at any block split, and one sync-flush marker. Saturates at `usize::MAX`.
pub fn deflate_compress_bound(in_bytes: usize) -> usize {
    let literal_expansion = in_bytes / 8 + usize::from(in_bytes % 8 != 0);
    let stored_headers = (in_bytes / STORED_BLOCK_SPAN)
        .saturating_add(1)
        .saturating_mul(STORED_BLOCK_OVERHEAD);
    in_bytes
        .saturating_add(literal_expansion)
        .saturating_add(stored_headers)
        .saturating_add(STREAM_OVERHEAD)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Map a resolved level to an engine level, rejecting what the engine
/// cannot configure.
fn engine_level(level: i32) -> Option<Compression> {
    u32::try_from(level)
        .ok()
        .filter(|&l| l <= MAX_ZIP_LEVEL as u32)
        .map(Compression::new)
}

/// How a bounded compression run must end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    /// Terminate the stream (final block, trailer if any).
    Finish,
    /// Byte-align on an empty stored block, leaving the stream open.
    Sync,
}

/// Drive `comp` over all of `input` into `output`.
///
/// Returns the number of bytes written, or `None` when the output is too
/// small or the engine reports an error. `comp` must be fresh.
fn compress_bounded(
    comp: &mut Compress,
    input: &[u8],
    output: &mut [u8],
    end: StreamEnd,
) -> Option<usize> {
    let flush = match end {
        StreamEnd::Finish => FlushCompress::Finish,
        StreamEnd::Sync => FlushCompress::Sync,
    };

    loop {
        let in_pos = comp.total_in() as usize;
        let out_pos = comp.total_out() as usize;
        if out_pos >= output.len() {
            // A full buffer leaves no way to tell a completed flush from a
            // truncated one.
            return None;
        }

        let status = comp
            .compress(&input[in_pos..], &mut output[out_pos..], flush)
            .ok()?;

        let consumed = comp.total_in() as usize;
        let written = comp.total_out() as usize;
        match (status, end) {
            (Status::StreamEnd, StreamEnd::Finish) => return Some(written),
            (Status::Ok, StreamEnd::Sync) if consumed == input.len() && written < output.len() => {
                return Some(written);
            }
            (Status::Ok, _) if consumed > in_pos || written > out_pos => continue,
            _ => return None,
        }
    }
}

/// Drive `inner` over `input` until the stream ends (or, when
/// `require_end` is false, until the input is exhausted).
fn inflate_bounded(
    inner: &mut Decompress,
    input: &[u8],
    output: &mut [u8],
    require_end: bool,
) -> EngineResult {
    let start_in = inner.total_in() as usize;
    let start_out = inner.total_out() as usize;
    let flush = if require_end {
        FlushDecompress::Finish
    } else {
        FlushDecompress::Sync
    };

    loop {
        let in_pos = inner.total_in() as usize - start_in;
        let out_pos = inner.total_out() as usize - start_out;

        let status = match inner.decompress(&input[in_pos..], &mut output[out_pos..], flush) {
            Ok(status) => status,
            Err(_) => return EngineResult::BadData,
        };

        let consumed = inner.total_in() as usize - start_in;
        let produced = inner.total_out() as usize - start_out;
        match status {
            Status::StreamEnd => return EngineResult::Success,
            _ if !require_end && consumed == input.len() => {
                if produced == output.len() {
                    return probe_pending_output(inner);
                }
                return EngineResult::Success;
            }
            Status::Ok if consumed > in_pos || produced > out_pos => continue,
            _ if produced == output.len() => return EngineResult::InsufficientSpace,
            _ if consumed == input.len() => return EngineResult::ShortOutput,
            _ => return EngineResult::BadData,
        }
    }
}

/// Check a full output buffer for decoded bytes the inflater could not
/// write. An engine error while draining counts as corrupt data.
fn probe_pending_output(inner: &mut Decompress) -> EngineResult {
    let mut probe = [0u8; 1];
    let before = inner.total_out();
    match inner.decompress(&[], &mut probe, FlushDecompress::Sync) {
        Err(_) => EngineResult::BadData,
        Ok(_) if inner.total_out() > before => EngineResult::InsufficientSpace,
        Ok(_) => EngineResult::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_bound_covers_empty_input() {
        assert!(deflate_compress_bound(0) >= STORED_BLOCK_OVERHEAD);
    }

    #[test]
    fn deflate_bound_grows_with_input() {
        let small = deflate_compress_bound(1000);
        let large = deflate_compress_bound(1_000_000);
        assert!(small > 1000);
        assert!(large > 1_000_000);
        assert!(large > small);
    }

    #[test]
    fn deflate_bound_saturates() {
        assert_eq!(deflate_compress_bound(usize::MAX), usize::MAX);
        assert_eq!(deflate_compress_bound(usize::MAX - 3), usize::MAX);
    }

    #[test]
    fn engine_level_range() {
        assert!(engine_level(0).is_some());
        assert!(engine_level(9).is_some());
        assert!(engine_level(10).is_none());
        assert!(engine_level(-1).is_none());
    }
}
