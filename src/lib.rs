//! Byte-pair LZ compressor.
//!
//! A single left-to-right scan finds back-references through a 2-byte key
//! table ([`match_finder`]), turns the input into literal-run/match chunks
//! ([`chunk`]) and packs them with nibble-pair lengths and escape-coded
//! overflow ([`bitstream`]). [`passes`] runs the wide-range pass that forms
//! the output, plus two narrow-range passes over its literal residue that are
//! only measured. [`decompress`] is a reference decoder for validation.

pub mod bitstream;
pub mod chunk;
pub mod config;
pub mod decompress;
mod error;
pub mod io_utils;
pub mod match_finder;
pub mod passes;
pub mod stats;

pub use bitstream::{max_compressed_len, serialize, serialize_into};
pub use chunk::{generate, Chunk, ParsedPass};
pub use config::{Config, PassParams};
pub use decompress::{
    decode_stream, decompress, decompress_with_limit, default_output_limit, StreamError,
};
pub use error::Lz4pjError;
pub use match_finder::MatchFinder;
pub use passes::{compress, compress_into, compress_with_report, run_pass, Compressed};
pub use stats::{PassReport, PassStats};
