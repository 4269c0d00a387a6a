// Error taxonomy shared by the single-stream and page-split codecs.
//
// Size-bound overflow is not an error kind: the bound estimator reports it as
// the saturated value `bound::SIZE_UNBOUNDED`.

use thiserror::Error;

/// Failure of a single codec call.
///
/// There is no partial success: when a call returns an error the contents of
/// the output buffer are unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A codec context could not be created, or the engine could not fit its
    /// output into the provided buffer.
    #[error("out of memory: compressor context unavailable or output buffer too small")]
    OutOfMemory,
    /// The compressed input is malformed, has trailing bytes, or does not
    /// fit into the provided output buffer.
    #[error("corrupt compressed data")]
    CorruptData,
}

/// Result alias used throughout the codec modules.
pub type Result<T> = std::result::Result<T, CodecError>;
