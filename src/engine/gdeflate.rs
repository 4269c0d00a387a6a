// Page-split deflate contexts.
//
// The input is cut into `page_count` equal spans (`page_span`), and each span
// is compressed by its own raw deflate compressor into its own output page.
// Pages never reference each other's data, so a page-parallel decoder can
// inflate them independently. Every page except the last non-empty one ends
// on a sync-flush boundary (empty stored block) and the last one carries the
// final block. As a consequence the pages, laid end to end, also form one
// valid raw deflate stream; the single-page decoder relies on that.

use flate2::{Compress, Decompress};

use super::{
    Decompressed, EngineResult, StreamEnd, compress_bounded, deflate_compress_bound,
    inflate_bounded,
};

/// Preferred uncompressed bytes per page.
pub const GDEFLATE_PAGE_SIZE: usize = 64 * 1024;

/// Uncompressed bytes covered by each page when `in_bytes` are split over
/// `page_count` pages. The last non-empty page may cover fewer.
pub fn page_span(in_bytes: usize, page_count: usize) -> usize {
    in_bytes.div_ceil(page_count.max(1))
}

/// Worst-case total size of a page-split stream holding `in_bytes`.
///
/// `page_count` is a hint on input and is revised upward so that no page
/// covers more than [`GDEFLATE_PAGE_SIZE`] bytes (and there is always at
/// least one page). Saturates at `usize::MAX`.
pub fn compress_bound(in_bytes: usize, page_count: &mut usize) -> usize {
    let required = in_bytes.div_ceil(GDEFLATE_PAGE_SIZE).max(1);
    let pages = (*page_count).max(required);
    *page_count = pages;
    deflate_compress_bound(page_span(in_bytes, pages)).saturating_mul(pages)
}

// ---------------------------------------------------------------------------
// Page descriptors
// ---------------------------------------------------------------------------

/// One output page: a slot in the caller's buffer plus its used length.
///
/// On input `nbytes` is ignored and the slot length is the page capacity; on
/// output `nbytes` holds the compressed bytes written at the start of `data`.
#[derive(Debug)]
pub struct OutPage<'a> {
    pub data: &'a mut [u8],
    pub nbytes: usize,
}

impl<'a> OutPage<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        let nbytes = data.len();
        Self { data, nbytes }
    }

    /// Slot capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

// ---------------------------------------------------------------------------
// Compressor
// ---------------------------------------------------------------------------

/// A page-split compressor context for one call.
pub struct Compressor {
    level: flate2::Compression,
}

impl Compressor {
    /// Allocate a compressor for `level` (0-9). Returns `None` for levels the
    /// engine cannot configure.
    pub fn new(level: i32) -> Option<Self> {
        Some(Self {
            level: super::engine_level(level)?,
        })
    }

    /// Compress `input` across `pages`, one span per page.
    ///
    /// Returns the total compressed bytes over all pages, or 0 when a page
    /// does not fit its slot or `pages` is empty. Pages past the last
    /// non-empty span get `nbytes == 0`.
    pub fn compress(self, input: &[u8], pages: &mut [OutPage<'_>]) -> usize {
        if pages.is_empty() {
            return 0;
        }
        let span = page_span(input.len(), pages.len());
        let used_pages = if span == 0 {
            1
        } else {
            input.len().div_ceil(span)
        };

        let mut total = 0usize;
        for (index, page) in pages.iter_mut().enumerate() {
            if index >= used_pages {
                page.nbytes = 0;
                continue;
            }
            let start = index * span;
            let end = (start + span).min(input.len());
            let end_of_stream = if index + 1 == used_pages {
                StreamEnd::Finish
            } else {
                StreamEnd::Sync
            };

            // Fresh deflate state per page keeps pages independent.
            let mut comp = Compress::new(self.level, false);
            match compress_bounded(&mut comp, &input[start..end], &mut page.data[..], end_of_stream) {
                Some(written) => {
                    log::trace!("gdeflate page {index}: {} -> {written} bytes", end - start);
                    page.nbytes = written;
                    total += written;
                }
                None => {
                    log::debug!(
                        "gdeflate page {index} does not fit its {} byte slot",
                        page.capacity()
                    );
                    return 0;
                }
            }
        }
        total
    }
}

// ---------------------------------------------------------------------------
// Decompressor
// ---------------------------------------------------------------------------

/// A page-split decompressor context for one call.
#[derive(Debug, Default)]
pub struct Decompressor;

impl Decompressor {
    pub fn new() -> Self {
        Self
    }

    /// Decompress `pages` in order into `output`.
    ///
    /// Each page is inflated independently, its output directly following
    /// the previous page's. Every page before the last non-empty one must
    /// decode to exactly `page_span` bytes; that page must end the stream.
    /// Empty trailing pages are skipped. `consumed` is the total over all
    /// pages.
    pub fn decompress(
        self,
        pages: &[&[u8]],
        page_span: usize,
        output: &mut [u8],
    ) -> Decompressed {
        let last = pages.iter().rposition(|page| !page.is_empty()).unwrap_or(0);
        let mut consumed = 0usize;
        let mut produced = 0usize;

        for (index, page) in pages.iter().enumerate().take(last + 1) {
            let rest = &mut output[produced..];
            let mut inner = Decompress::new(false);
            let result = if index == last {
                inflate_bounded(&mut inner, page, rest, true)
            } else {
                let window = page_span.min(rest.len());
                let result = inflate_bounded(&mut inner, page, &mut rest[..window], false);
                close_open_page(result, inner.total_out() as usize, page_span)
            };

            consumed += inner.total_in() as usize;
            produced += inner.total_out() as usize;
            if result != EngineResult::Success {
                log::debug!("gdeflate page {index} failed: {result:?}");
                return Decompressed {
                    result,
                    consumed,
                    produced,
                };
            }
        }

        Decompressed {
            result: EngineResult::Success,
            consumed,
            produced,
        }
    }

    /// Decompress a single page that does not end the stream, as a
    /// page-parallel decoder would for every page but the last.
    ///
    /// `output` must be exactly the page's span: a page decoding to fewer
    /// bytes is reported as `ShortOutput`.
    pub fn decompress_open_page(self, page: &[u8], output: &mut [u8]) -> Decompressed {
        let expected = output.len();
        let mut inner = Decompress::new(false);
        let result = inflate_bounded(&mut inner, page, output, false);
        let produced = inner.total_out() as usize;
        Decompressed {
            result: close_open_page(result, produced, expected),
            consumed: inner.total_in() as usize,
            produced,
        }
    }
}

/// An open page that stops short of its span was cut off mid-block.
fn close_open_page(result: EngineResult, produced: usize, expected: usize) -> EngineResult {
    match result {
        EngineResult::Success if produced < expected => EngineResult::ShortOutput,
        result => result,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(len: usize) -> Vec<u8> {
        b"page split deflate sample "
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect()
    }

    /// Compress into evenly sized slots; returns (buffer, slot size, used lengths).
    fn compress_into_slots(input: &[u8], hint: usize) -> (Vec<u8>, usize, Vec<usize>) {
        let mut page_count = hint;
        let bound = compress_bound(input.len(), &mut page_count);
        let slot = bound / page_count;
        let mut buf = vec![0u8; slot * page_count];
        let mut pages: Vec<OutPage<'_>> = buf.chunks_mut(slot).map(OutPage::new).collect();
        let total = Compressor::new(6).unwrap().compress(input, &mut pages);
        assert!(total > 0);
        let used: Vec<usize> = pages.iter().map(|p| p.nbytes).collect();
        assert_eq!(used.iter().sum::<usize>(), total);
        drop(pages);
        (buf, slot, used)
    }

    #[test]
    fn bound_revises_page_count_up() {
        let mut pages = 1;
        compress_bound(3 * GDEFLATE_PAGE_SIZE + 1, &mut pages);
        assert_eq!(pages, 4);

        let mut pages = 0;
        compress_bound(0, &mut pages);
        assert_eq!(pages, 1);
    }

    #[test]
    fn bound_keeps_larger_hint() {
        let mut pages = 8;
        compress_bound(1000, &mut pages);
        assert_eq!(pages, 8);
    }

    #[test]
    fn bound_saturates() {
        let mut pages = 1;
        assert_eq!(compress_bound(usize::MAX, &mut pages), usize::MAX);
    }

    #[test]
    fn page_span_rounds_up() {
        assert_eq!(page_span(10, 4), 3);
        assert_eq!(page_span(0, 4), 0);
        assert_eq!(page_span(10, 0), 10);
    }

    #[test]
    fn pages_decode_independently() {
        let input = text(3 * GDEFLATE_PAGE_SIZE);
        let (buf, slot, used) = compress_into_slots(&input, 3);
        assert_eq!(used.len(), 3);

        let span = page_span(input.len(), 3);
        for (i, &len) in used.iter().enumerate() {
            let page = &buf[i * slot..i * slot + len];
            let mut out = vec![0u8; span];
            let d = if i + 1 < used.len() {
                Decompressor::new().decompress_open_page(page, &mut out)
            } else {
                Decompressor::new().decompress(&[page], span, &mut out)
            };
            assert_eq!(d.result, EngineResult::Success, "page {i}");
            assert_eq!(d.produced, span);
            assert_eq!(out, input[i * span..(i + 1) * span]);
        }
    }

    #[test]
    fn concatenated_pages_form_one_stream() {
        let input = text(2 * GDEFLATE_PAGE_SIZE + 777);
        let (buf, slot, used) = compress_into_slots(&input, 1);

        let mut joined = Vec::new();
        for (i, &len) in used.iter().enumerate() {
            joined.extend_from_slice(&buf[i * slot..i * slot + len]);
        }

        let mut out = vec![0u8; input.len()];
        let d = Decompressor::new().decompress(&[joined.as_slice()], input.len(), &mut out);
        assert_eq!(d.result, EngineResult::Success);
        assert_eq!(d.consumed, joined.len());
        assert_eq!(out, input);
    }

    #[test]
    fn extra_pages_stay_empty() {
        let input = text(9);
        let mut buf = vec![0u8; 4 * 64];
        let mut pages: Vec<OutPage<'_>> = buf.chunks_mut(64).map(OutPage::new).collect();
        let total = Compressor::new(4).unwrap().compress(&input, &mut pages);
        assert!(total > 0);
        // span 3 -> three pages carry data, the fourth is unused.
        assert!(pages[..3].iter().all(|p| p.nbytes > 0));
        assert_eq!(pages[3].nbytes, 0);
    }

    #[test]
    fn empty_input_uses_one_page() {
        let mut buf = vec![0u8; 32];
        let mut pages = [OutPage::new(&mut buf)];
        let total = Compressor::new(4).unwrap().compress(&[], &mut pages);
        assert!(total > 0);

        let mut out = [0u8; 8];
        let d = Decompressor::new().decompress(&[&buf[..total]], 0, &mut out);
        assert_eq!(d.result, EngineResult::Success);
        assert_eq!(d.produced, 0);
    }

    #[test]
    fn too_small_slot_fails() {
        let input = text(4096);
        let mut buf = vec![0u8; 8];
        let mut pages = [OutPage::new(&mut buf)];
        assert_eq!(Compressor::new(6).unwrap().compress(&input, &mut pages), 0);
        assert_eq!(Compressor::new(6).unwrap().compress(&input, &mut []), 0);
    }

    #[test]
    fn truncated_open_page_is_short() {
        let input = text(3 * GDEFLATE_PAGE_SIZE);
        let (buf, _, used) = compress_into_slots(&input, 3);
        let half = &buf[..used[0] / 2];

        let mut out = vec![0u8; GDEFLATE_PAGE_SIZE];
        let d = Decompressor::new().decompress_open_page(half, &mut out);
        assert_eq!(d.result, EngineResult::ShortOutput);
        assert!(d.produced < GDEFLATE_PAGE_SIZE);
    }

    #[test]
    fn truncated_leading_page_fails_sequence() {
        let input = text(3 * GDEFLATE_PAGE_SIZE);
        let (buf, slot, used) = compress_into_slots(&input, 3);
        let span = page_span(input.len(), 3);
        let pages = [
            &buf[..used[0] / 2],
            &buf[slot..slot + used[1]],
            &buf[2 * slot..2 * slot + used[2]],
        ];

        let mut out = vec![0u8; input.len()];
        let d = Decompressor::new().decompress(&pages, span, &mut out);
        assert_eq!(d.result, EngineResult::ShortOutput);
        assert!(d.produced < span);
    }

    #[test]
    fn full_page_with_garbage_tail_is_rejected() {
        let input = text(2 * GDEFLATE_PAGE_SIZE);
        let (buf, _, used) = compress_into_slots(&input, 2);
        let mut page = buf[..used[0]].to_vec();
        // BFINAL=1 with the reserved block type.
        page.push(0xff);

        let mut out = vec![0u8; GDEFLATE_PAGE_SIZE];
        let d = Decompressor::new().decompress_open_page(&page, &mut out);
        assert_ne!(d.result, EngineResult::Success);
    }

    #[test]
    fn open_page_into_larger_output_is_short() {
        let input = text(2 * GDEFLATE_PAGE_SIZE);
        let (buf, _, used) = compress_into_slots(&input, 2);

        let mut out = vec![0u8; GDEFLATE_PAGE_SIZE + 1];
        let d = Decompressor::new().decompress_open_page(&buf[..used[0]], &mut out);
        assert_eq!(d.result, EngineResult::ShortOutput);
        assert_eq!(d.produced, GDEFLATE_PAGE_SIZE);
    }

    #[test]
    fn trailing_empty_pages_are_skipped() {
        let input = text(9);
        let mut buf = vec![0u8; 4 * 64];
        let used: Vec<usize> = {
            let mut pages: Vec<OutPage<'_>> = buf.chunks_mut(64).map(OutPage::new).collect();
            assert!(Compressor::new(4).unwrap().compress(&input, &mut pages) > 0);
            pages.iter().map(|p| p.nbytes).collect()
        };
        let pages: Vec<&[u8]> = used
            .iter()
            .enumerate()
            .map(|(i, &len)| &buf[i * 64..i * 64 + len])
            .collect();

        let mut out = vec![0u8; input.len()];
        let d = Decompressor::new().decompress(&pages, page_span(9, 4), &mut out);
        assert_eq!(d.result, EngineResult::Success);
        assert_eq!(out, input);
    }

    #[test]
    fn corrupt_page_is_rejected() {
        let mut out = vec![0u8; 64];
        let garbage: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let d = Decompressor::new().decompress(&[garbage], 64, &mut out);
        assert_ne!(d.result, EngineResult::Success);
    }
}
