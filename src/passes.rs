//! Pass orchestration.
//!
//! The wide-range pass over the raw input produces the returned stream. Its
//! leftover literal buffer is then run through the fixed 3-byte and 2-byte
//! passes purely to measure how small they would get; those encodings are
//! discarded and the residue stays stored raw in the main stream.

use tracing::info;

use crate::bitstream::{serialize, serialize_into};
use crate::chunk::{generate, ParsedPass};
use crate::config::{Config, PassParams};
use crate::stats::{PassReport, PassStats};
use crate::Lz4pjError;

/// Compressed stream together with the per-pass statistics.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub report: PassReport,
}

/// Generate and serialize one pass, returning its bytes and counters.
pub fn run_pass(raw: &[u8], params: &PassParams) -> Result<(Vec<u8>, PassStats), Lz4pjError> {
    let pass = generate(raw, params)?;
    let bytes = serialize(&pass, params)?;
    let stats = PassStats::new(raw.len(), &pass, bytes.len());
    Ok((bytes, stats))
}

fn measure_residue(main: &ParsedPass, params: &PassParams, label: &str) -> Result<PassStats, Lz4pjError> {
    let (_, stats) = run_pass(&main.literals, params)?;
    info!(
        pass = label,
        input = stats.input_len,
        chunks = stats.chunks,
        compressed = stats.compressed_len,
        "residue pass"
    );
    Ok(stats)
}

fn residue_report(main: &ParsedPass, config: &Config) -> Result<(Option<PassStats>, Option<PassStats>), Lz4pjError> {
    if !config.residue_passes {
        return Ok((None, None));
    }
    let three = measure_residue(main, &PassParams::THREE_BYTE, "3-byte")?;
    let two = measure_residue(main, &PassParams::TWO_BYTE, "2-byte")?;
    Ok((Some(three), Some(two)))
}

/// Run all passes and return the main-pass stream with its report.
pub fn compress_with_report(raw: &[u8], config: &Config) -> Result<Compressed, Lz4pjError> {
    let main = generate(raw, &PassParams::MAIN)?;
    let (three_byte, two_byte) = residue_report(&main, config)?;

    let bytes = serialize(&main, &PassParams::MAIN)?;
    let report = PassReport {
        main: PassStats::new(raw.len(), &main, bytes.len()),
        three_byte,
        two_byte,
    };
    info!(
        input = raw.len(),
        chunks = report.main.chunks,
        literals = report.main.literals,
        trailing = report.main.trailing_len,
        compressed = bytes.len(),
        "main pass"
    );
    Ok(Compressed { bytes, report })
}

/// Compress `raw` with the default configuration.
pub fn compress(raw: &[u8]) -> Result<Vec<u8>, Lz4pjError> {
    compress_with_report(raw, &Config::default()).map(|c| c.bytes)
}

/// Compress into a caller buffer, returning the number of bytes written.
///
/// Use [`crate::max_compressed_len`] with [`PassParams::MAIN`] to size `dst`;
/// a smaller buffer fails with [`Lz4pjError::BufferOverflow`] instead of
/// writing past its end.
pub fn compress_into(raw: &[u8], dst: &mut [u8], config: &Config) -> Result<(usize, PassReport), Lz4pjError> {
    let main = generate(raw, &PassParams::MAIN)?;
    let (three_byte, two_byte) = residue_report(&main, config)?;
    let len = serialize_into(&main, &PassParams::MAIN, dst)?;
    let report = PassReport {
        main: PassStats::new(raw.len(), &main, len),
        three_byte,
        two_byte,
    };
    Ok((len, report))
}
