// Page-split codec.
//
// Compression carves the caller's contiguous output into fixed-size page
// slots, lets the engine compress one input span into each slot, then
// compacts the pages so the used bytes are contiguous:
//
//   before:  [p0 data | pad ][p1 data |   pad  ][p2 data | pad    ]
//   after:   [p0 data][p1 data][p2 data]
//
// Decompression treats the whole input as a single page.

use crate::engine::{EngineResult, gdeflate};
use crate::error::{CodecError, Result};
use crate::level::{DefaultLevel, ProcessDefault, resolve_level};

/// Layout of a compacted page-split output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedOutput {
    /// Total compressed bytes at the start of the output buffer.
    pub len: usize,
    /// Compressed length of each page, in order. Pages are contiguous, so
    /// page `i` starts at the sum of the lengths before it.
    pub page_lens: Vec<usize>,
}

impl PagedOutput {
    /// Byte range of each page within the compacted output.
    pub fn page_ranges(&self) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
        self.page_lens.iter().scan(0usize, |start, &len| {
            let range = *start..*start + len;
            *start += len;
            Some(range)
        })
    }
}

/// Compress `input` into `output` with the page-split codec.
///
/// `page_count` and `page_size` normally come from
/// [`crate::bound::max_gdeflate_compressed_size`]; `page_count == 0` means a
/// single page spanning all of `output`. Every page slot but the last holds
/// `page_size` bytes; the last takes the rest of `output`. Returns the total
/// compacted length.
///
/// # Errors
///
/// [`CodecError::OutOfMemory`] if no compressor exists for the resolved
/// level, the page geometry does not fit `output`, or a page's compressed
/// data does not fit its slot.
pub fn compress_paged(
    level: i32,
    input: &[u8],
    output: &mut [u8],
    page_count: usize,
    page_size: usize,
) -> Result<usize> {
    compress_paged_layout(&ProcessDefault, level, input, output, page_count, page_size)
        .map(|layout| layout.len)
}

/// [`compress_paged`] with an explicit default-level source, also reporting
/// where each page ended up after compaction.
pub fn compress_paged_layout<D: DefaultLevel + ?Sized>(
    defaults: &D,
    level: i32,
    input: &[u8],
    output: &mut [u8],
    page_count: usize,
    page_size: usize,
) -> Result<PagedOutput> {
    let level = resolve_level(level, defaults);
    let page_count = page_count.max(1);
    let page_size = if page_count == 1 { output.len() } else { page_size };

    let last_page = page_count - 1;
    let fits = (page_count == 1 || page_size > 0)
        && last_page
            .checked_mul(page_size)
            .is_some_and(|start| start <= output.len());
    if !fits {
        log::debug!(
            "{page_count} pages of {page_size} bytes do not fit in {} bytes",
            output.len()
        );
        return Err(CodecError::OutOfMemory);
    }

    let Some(compressor) = gdeflate::Compressor::new(level) else {
        log::debug!("no gdeflate compressor for level {level}");
        return Err(CodecError::OutOfMemory);
    };

    log::debug!(
        "gdeflate level {level}: {} bytes into {page_count} pages of {page_size}",
        input.len()
    );

    let page_lens = {
        let mut pages = page_descriptors(output, page_count, page_size);
        if compressor.compress(input, &mut pages) == 0 {
            return Err(CodecError::OutOfMemory);
        }
        pages.iter().map(|page| page.nbytes).collect::<Vec<_>>()
    };

    let len = compact_pages(output, page_size, &page_lens);
    Ok(PagedOutput { len, page_lens })
}

/// Split `output` into `page_count` descriptors: all `page_size` bytes long
/// except the last, which takes whatever remains.
///
/// The caller has checked that `(page_count - 1) * page_size <= output.len()`.
fn page_descriptors(
    output: &mut [u8],
    page_count: usize,
    page_size: usize,
) -> Vec<gdeflate::OutPage<'_>> {
    let mut pages = Vec::with_capacity(page_count);
    let mut rest = output;
    for _ in 1..page_count {
        let (page, tail) = std::mem::take(&mut rest).split_at_mut(page_size);
        pages.push(gdeflate::OutPage::new(page));
        rest = tail;
    }
    pages.push(gdeflate::OutPage::new(rest));
    pages
}

/// Move every page's used bytes down to directly follow the previous page.
///
/// Page `i` was written at `i * page_size`. Ranges may overlap once an
/// earlier page came out short, hence `copy_within`. Returns the compacted
/// length.
fn compact_pages(output: &mut [u8], page_size: usize, page_lens: &[usize]) -> usize {
    let Some((&first, rest)) = page_lens.split_first() else {
        return 0;
    };
    let mut dest = first;
    for (index, &len) in rest.iter().enumerate() {
        let src = (index + 1) * page_size;
        if src != dest {
            output.copy_within(src..src + len, dest);
        }
        dest += len;
    }
    dest
}

/// Decompress a page-split stream from `input` into `output`.
///
/// The whole input is decoded as one page. Returns the number of bytes
/// written.
///
/// # Errors
///
/// [`CodecError::CorruptData`] if the engine rejects the data or the
/// decompressed size exceeds `output.len()`.
pub fn decompress_paged(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let decompressed = gdeflate::Decompressor::new().decompress(&[input], output.len(), output);
    match decompressed.result {
        EngineResult::Success => Ok(decompressed.produced),
        result => {
            log::debug!("gdeflate decode failed: {result:?}");
            Err(CodecError::CorruptData)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
