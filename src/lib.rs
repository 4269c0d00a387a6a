//! Chunkzip: bounded zlib and page-split deflate compression for
//! fixed-capacity chunk buffers.
//!
//! The crate provides:
//! - Worst-case output size estimation (`bound`)
//! - A single-stream zlib codec and a page-split deflate codec (`codec`)
//! - Compression level resolution with a process-wide default (`level`)
//! - The flate2-backed engine both codecs drive (`engine`)
//! - An optional CLI (`cli` feature)
//!
//! Every call writes into a caller-owned buffer and returns the number of
//! bytes produced. Size compression buffers with the bound functions first.
//!
//! # Quick Start
//!
//! ```
//! use chunkzip::{compress, decompress, max_compressed_size};
//!
//! let chunk = b"scanline scanline scanline scanline";
//! let mut packed = vec![0u8; max_compressed_size(chunk.len())];
//! let n = compress(-1, chunk, &mut packed).unwrap();
//!
//! let mut unpacked = vec![0u8; chunk.len()];
//! let m = decompress(&packed[..n], &mut unpacked).unwrap();
//! assert_eq!(&unpacked[..m], chunk);
//! ```
//!
//! Page-split compression follows the same pattern, with the page geometry
//! taken from the bound:
//!
//! ```
//! use chunkzip::{compress_paged, decompress_paged, max_gdeflate_compressed_size};
//!
//! let chunk = vec![42u8; 300_000];
//! let bound = max_gdeflate_compressed_size(chunk.len(), 1);
//! let mut packed = vec![0u8; bound.max_size];
//! let n = compress_paged(-1, &chunk, &mut packed, bound.page_count, bound.page_size).unwrap();
//!
//! let mut unpacked = vec![0u8; chunk.len()];
//! decompress_paged(&packed[..n], &mut unpacked).unwrap();
//! assert_eq!(unpacked, chunk);
//! ```

pub mod bound;
pub mod codec;
pub mod engine;
pub mod error;
pub mod level;

#[cfg(feature = "cli")]
pub mod cli;

pub use bound::{
    GdeflateBound, SIZE_UNBOUNDED, is_unbounded, max_compressed_size,
    max_gdeflate_compressed_size,
};
pub use codec::{
    PagedOutput, ZipCodec, compress, compress_paged, decompress, decompress_paged,
};
pub use error::CodecError;
pub use level::{DEFAULT_ZIP_LEVEL, DefaultLevel, default_level, set_default_level};
