use thiserror::Error;

use crate::decompress::StreamError;

#[derive(Error, Debug)]
pub enum Lz4pjError {
    /// Writer would run past the end of the destination buffer.
    #[error("output buffer overflow: need {needed} bytes, capacity is {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },

    /// Reserving the output or scratch buffers failed.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// Positions are tracked as `u32`, so larger inputs cannot be indexed.
    #[error("input too large: {0} bytes exceeds the 32-bit position range")]
    InputTooLarge(usize),

    /// Invalid pass parameters.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed compressed stream.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Catch all for broken internal invariants.
    #[error("internal error: {0}")]
    Internal(String),
}
