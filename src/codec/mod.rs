// Chunk codecs built on the deflate engine.
//
// - `stream`: single zlib stream per chunk
// - `paged`:  page-split deflate, compacted into one contiguous buffer
//
// `ZipCodec` bundles both behind one value carrying the source of the
// default compression level.

pub mod paged;
pub mod stream;

pub use paged::{PagedOutput, compress_paged, decompress_paged};
pub use stream::{compress, decompress};

use crate::bound::{self, GdeflateBound};
use crate::error::Result;
use crate::level::{DefaultLevel, ProcessDefault};

/// Entry point for both codecs with an injected default-level source.
///
/// Holds no engine state: every method allocates and releases its own
/// context, so a shared `ZipCodec` can be used from many threads at once.
///
/// # Example
/// ```
/// use chunkzip::ZipCodec;
///
/// let codec = ZipCodec::with_default_level(Some(6));
/// let input = b"pixels pixels pixels pixels";
/// let mut packed = vec![0u8; codec.max_compressed_size(input.len())];
/// let n = codec.compress(-1, input, &mut packed).unwrap();
///
/// let mut unpacked = vec![0u8; input.len()];
/// codec.decompress(&packed[..n], &mut unpacked).unwrap();
/// assert_eq!(&unpacked, input);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec<L = ProcessDefault> {
    levels: L,
}

impl ZipCodec<ProcessDefault> {
    /// A codec reading the process-wide default level.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ZipCodec<Option<i32>> {
    /// A codec with a fixed default level (`None` for the built-in one).
    pub fn with_default_level(level: Option<i32>) -> Self {
        Self { levels: level }
    }
}

impl<L: DefaultLevel> ZipCodec<L> {
    /// A codec consulting `levels` for negative level requests.
    pub fn with_levels(levels: L) -> Self {
        Self { levels }
    }

    /// See [`bound::max_compressed_size`].
    pub fn max_compressed_size(&self, in_bytes: usize) -> usize {
        bound::max_compressed_size(in_bytes)
    }

    /// See [`bound::max_gdeflate_compressed_size`].
    pub fn max_gdeflate_compressed_size(
        &self,
        in_bytes: usize,
        page_count_hint: usize,
    ) -> GdeflateBound {
        bound::max_gdeflate_compressed_size(in_bytes, page_count_hint)
    }

    /// See [`stream::compress`].
    pub fn compress(&self, level: i32, input: &[u8], output: &mut [u8]) -> Result<usize> {
        stream::compress_with(&self.levels, level, input, output)
    }

    /// See [`stream::decompress`].
    pub fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        stream::decompress(input, output)
    }

    /// See [`paged::compress_paged`].
    pub fn compress_paged(
        &self,
        level: i32,
        input: &[u8],
        output: &mut [u8],
        page_count: usize,
        page_size: usize,
    ) -> Result<usize> {
        self.compress_paged_layout(level, input, output, page_count, page_size)
            .map(|layout| layout.len)
    }

    /// See [`paged::compress_paged_layout`].
    pub fn compress_paged_layout(
        &self,
        level: i32,
        input: &[u8],
        output: &mut [u8],
        page_count: usize,
        page_size: usize,
    ) -> Result<PagedOutput> {
        paged::compress_paged_layout(&self.levels, level, input, output, page_count, page_size)
    }

    /// See [`paged::decompress_paged`].
    pub fn decompress_paged(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        paged::decompress_paged(input, output)
    }
}
