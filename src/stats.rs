//! Per-pass counters reported by the orchestrator.

use serde::Serialize;

use crate::chunk::ParsedPass;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Bytes fed to the generator.
    pub input_len: usize,
    pub chunks: usize,
    pub literals: usize,
    pub trailing_len: u32,
    /// Serialized size of the pass.
    pub compressed_len: usize,
}

impl PassStats {
    pub fn new(input_len: usize, pass: &ParsedPass, compressed_len: usize) -> Self {
        Self {
            input_len,
            chunks: pass.chunks.len(),
            literals: pass.literals.len(),
            trailing_len: pass.trailing_len,
            compressed_len,
        }
    }

    /// Compressed size as a percentage of the input.
    pub fn ratio(&self) -> f64 {
        if self.input_len == 0 {
            0.0
        } else {
            self.compressed_len as f64 * 100.0 / self.input_len as f64
        }
    }
}

/// Sizes of every pass run for one input. Only `main` describes the
/// returned stream; the residue passes are measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    pub main: PassStats,
    pub three_byte: Option<PassStats>,
    pub two_byte: Option<PassStats>,
}
