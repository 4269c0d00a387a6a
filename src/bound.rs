// Worst-case compressed size estimation.
//
// Callers size their output buffers from these bounds before compressing, so
// an underestimate is a correctness bug while an overestimate only costs
// memory. Two margins are combined and the larger wins:
//
//   1. the engine's native bound plus `BLOCK_ALIGNMENT_PAD`;
//   2. the legacy container sizing rule `n * 130 / 128 + 100`, kept so that
//      buffers are never smaller than what previously shipped readers and
//      writers allocated.
//
// Arithmetic overflow saturates to `SIZE_UNBOUNDED`; callers must reject
// that value instead of trying to allocate it.

use crate::engine::{gdeflate, zlib};

/// Saturation value: the input is too large to be bounded.
pub const SIZE_UNBOUNDED: usize = usize::MAX;

/// Extra bytes on top of the native bound for the engine's output-end
/// alignment margin.
pub const BLOCK_ALIGNMENT_PAD: usize = 9;

const LEGACY_SCALE_NUM: usize = 130;
const LEGACY_SCALE_DEN: usize = 128;
const LEGACY_PAD: usize = 100;

/// Whether a bound is the saturation value and must be rejected.
pub fn is_unbounded(size: usize) -> bool {
    size == SIZE_UNBOUNDED
}

/// Apply both safety margins to a native engine bound.
fn pad_bound(in_bytes: usize, native: usize) -> usize {
    let Some(native) = native.checked_add(BLOCK_ALIGNMENT_PAD) else {
        return SIZE_UNBOUNDED;
    };
    let Some(scaled) = in_bytes.checked_mul(LEGACY_SCALE_NUM) else {
        return SIZE_UNBOUNDED;
    };
    let Some(legacy) = (scaled / LEGACY_SCALE_DEN).checked_add(LEGACY_PAD) else {
        return SIZE_UNBOUNDED;
    };
    native.max(legacy)
}

/// Upper bound on the single-stream (zlib) compressed size of `in_bytes`.
///
/// Returns [`SIZE_UNBOUNDED`] when the bound is not representable.
pub fn max_compressed_size(in_bytes: usize) -> usize {
    pad_bound(in_bytes, zlib::compress_bound(in_bytes))
}

/// Output geometry for the page-split codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdeflateBound {
    /// Upper bound on the whole compressed output.
    pub max_size: usize,
    /// Number of pages, possibly revised upward by the engine.
    pub page_count: usize,
    /// Nominal page slot size: `max_size / page_count`, truncated. The last
    /// page absorbs the remainder.
    pub page_size: usize,
}

impl GdeflateBound {
    /// Whether the total bound saturated and must be rejected.
    pub fn is_unbounded(&self) -> bool {
        is_unbounded(self.max_size)
    }
}

/// Upper bound on the page-split compressed size of `in_bytes`, with the
/// page geometry to hand to [`crate::codec::paged::compress_paged`].
///
/// `page_count_hint` of 0 lets the engine choose.
pub fn max_gdeflate_compressed_size(in_bytes: usize, page_count_hint: usize) -> GdeflateBound {
    let mut page_count = page_count_hint;
    let native = gdeflate::compress_bound(in_bytes, &mut page_count);
    let page_count = page_count.max(1);
    let max_size = pad_bound(in_bytes, native);
    let page_size = if is_unbounded(max_size) {
        SIZE_UNBOUNDED
    } else {
        max_size / page_count
    };
    log::trace!(
        "gdeflate bound for {in_bytes} bytes: {max_size} over {page_count} pages of {page_size}"
    );
    GdeflateBound {
        max_size,
        page_count,
        page_size,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
