//! Reference decoder for validating streams written by [`crate::bitstream`].
//!
//! The stream does not record its pass parameters; callers pass the same
//! [`PassParams`] the encoder used. All input is treated as untrusted.

use thiserror::Error;

use crate::bitstream::{ESCAPE, NIBBLE_MAX, VERSION};
use crate::chunk::{Chunk, ParsedPass};
use crate::config::{PassParams, MIN_MATCH_OFFSET};
use crate::Lz4pjError;

/// Errors raised while parsing or replaying a compressed stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream truncated")]
    Truncated,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("varint does not fit in 32 bits")]
    VarintOverflow,
    #[error("length does not fit in 32 bits")]
    LengthOverflow,
    #[error("match length {0} is invalid for this pass")]
    InvalidMatchLength(u32),
    #[error("chunk lengths run past the literal buffer")]
    LiteralOverrun,
    #[error("literal buffer holds {available} bytes but {consumed} are referenced")]
    LiteralMismatch { consumed: u64, available: usize },
    #[error("match offset {offset} is invalid at output position {position}")]
    OffsetOutOfRange { offset: u32, position: u64 },
    #[error("{0} unexpected bytes after the stream")]
    TrailingBytes(usize),
    #[error("output exceeds the {0} byte limit")]
    OutputLimit(usize),
}

/// Byte cursor used by the decoder.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        let byte = *self.data.get(self.pos).ok_or(StreamError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], StreamError> {
        if n > self.remaining() {
            return Err(StreamError::Truncated);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_varint(&mut self) -> Result<u32, StreamError> {
        let mut value = 0u32;
        for group in 0..5 {
            let byte = self.read_u8()?;
            let bits = (byte & 0x7F) as u32;
            if group == 4 && bits > 0x0F {
                return Err(StreamError::VarintOverflow);
            }
            value |= bits << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(StreamError::VarintOverflow)
    }

    /// Expand a nibble through the overflow cascade. The result still has
    /// the pass minimum subtracted.
    pub fn read_long_len(&mut self, nibble: u8) -> Result<u32, StreamError> {
        if (nibble as u32) < NIBBLE_MAX {
            return Ok(nibble as u32);
        }
        let first = self.read_u8()?;
        if first != ESCAPE {
            return Ok(NIBBLE_MAX + first as u32);
        }
        let base = NIBBLE_MAX + ESCAPE as u32;
        let high = self.read_u8()?;
        let rest = if high == ESCAPE {
            let word = self.read_bytes(4)?;
            u32::from_be_bytes([word[0], word[1], word[2], word[3]])
        } else {
            u32::from_be_bytes([0, 0, high, self.read_u8()?])
        };
        base.checked_add(rest).ok_or(StreamError::LengthOverflow)
    }

    pub fn read_len_pair(&mut self, min_len: u32) -> Result<(u32, u32), StreamError> {
        let nibbles = self.read_u8()?;
        let len1 = self.read_long_len(nibbles >> 4)?;
        let len2 = self.read_long_len(nibbles & 0x0F)?;
        Ok((
            len1.checked_add(min_len).ok_or(StreamError::LengthOverflow)?,
            len2.checked_add(min_len).ok_or(StreamError::LengthOverflow)?,
        ))
    }

    /// Read `count` lengths written two per nibble byte, dropping the pad.
    pub fn read_lens(&mut self, count: usize, min_len: u32) -> Result<Vec<u32>, StreamError> {
        let mut lens = Vec::with_capacity(count);
        while lens.len() < count {
            let (first, second) = self.read_len_pair(min_len)?;
            lens.push(first);
            if lens.len() < count {
                lens.push(second);
            }
        }
        Ok(lens)
    }

    pub fn read_match_offset(&mut self, params: &PassParams) -> Result<u32, StreamError> {
        if params.single_byte_offsets() {
            Ok(match self.read_u8()? {
                0 => 256,
                b => b as u32,
            })
        } else {
            self.read_varint()?
                .checked_add(MIN_MATCH_OFFSET)
                .ok_or(StreamError::LengthOverflow)
        }
    }
}

/// Parse a stream back into its literal buffer, chunks and trailing length.
pub fn decode_stream(data: &[u8], params: &PassParams) -> Result<ParsedPass, Lz4pjError> {
    let mut reader = ByteReader::from_slice(data);

    let version = reader.read_u8()?;
    if version != VERSION {
        return Err(StreamError::UnsupportedVersion(version).into());
    }

    let n_lits = reader.read_varint()? as usize;
    let literals = reader.read_bytes(n_lits)?.to_vec();

    let n_chunks = reader.read_varint()? as usize;
    // Every chunk stores at least one offset byte.
    if n_chunks > reader.remaining() {
        return Err(StreamError::Truncated.into());
    }

    let literal_lens = reader.read_lens(n_chunks, 0)?;
    let match_lens = if params.is_fixed_length() {
        vec![params.min_match_len; n_chunks]
    } else {
        reader.read_lens(n_chunks, params.min_match_len)?
    };

    let mut chunks = Vec::with_capacity(n_chunks);
    for (&literal_len, &match_len) in literal_lens.iter().zip(&match_lens) {
        if params.max_match_len != 0 && match_len > params.max_match_len {
            return Err(StreamError::InvalidMatchLength(match_len).into());
        }
        chunks.push(Chunk {
            literal_len,
            match_len,
            match_offset: reader.read_match_offset(params)?,
        });
    }

    let trailing_len = reader.read_varint()?;
    if reader.remaining() > 0 {
        return Err(StreamError::TrailingBytes(reader.remaining()).into());
    }

    let pass = ParsedPass {
        chunks,
        literals,
        trailing_len,
    };
    if pass.literal_total() != pass.literals.len() as u64 {
        return Err(StreamError::LiteralMismatch {
            consumed: pass.literal_total(),
            available: pass.literals.len(),
        }
        .into());
    }
    Ok(pass)
}

fn take<'a>(lits: &mut &'a [u8], n: u32) -> Result<&'a [u8], StreamError> {
    let n = n as usize;
    if n > lits.len() {
        return Err(StreamError::LiteralOverrun);
    }
    let (run, rest) = lits.split_at(n);
    *lits = rest;
    Ok(run)
}

fn ensure_room(out: &[u8], extra: u32, limit: usize) -> Result<(), StreamError> {
    if out.len().saturating_add(extra as usize) > limit {
        return Err(StreamError::OutputLimit(limit));
    }
    Ok(())
}

/// Rebuild the raw bytes, refusing to produce more than `limit` bytes.
pub fn decompress_with_limit(
    data: &[u8],
    params: &PassParams,
    limit: usize,
) -> Result<Vec<u8>, Lz4pjError> {
    let pass = decode_stream(data, params)?;
    let mut lits = pass.literals.as_slice();
    let mut out = Vec::with_capacity(pass.literals.len());

    for chunk in &pass.chunks {
        ensure_room(&out, chunk.literal_len, limit)?;
        out.extend_from_slice(take(&mut lits, chunk.literal_len)?);

        let offset = chunk.match_offset as usize;
        if offset > out.len() || !params.accepts_offset(chunk.match_offset) {
            return Err(StreamError::OffsetOutOfRange {
                offset: chunk.match_offset,
                position: out.len() as u64,
            }
            .into());
        }
        ensure_room(&out, chunk.match_len, limit)?;
        // Byte at a time: the source may overlap the bytes being produced.
        let start = out.len() - offset;
        for k in 0..chunk.match_len as usize {
            let byte = out[start + k];
            out.push(byte);
        }
    }

    ensure_room(&out, pass.trailing_len, limit)?;
    out.extend_from_slice(take(&mut lits, pass.trailing_len)?);
    Ok(out)
}

/// Output floor of [`default_output_limit`].
pub const MIN_OUTPUT_LIMIT: usize = 64 << 20;
/// Largest expansion [`default_output_limit`] allows above the floor.
pub const MAX_EXPANSION: usize = 1 << 10;

/// Output ceiling for a stream of `stream_len` bytes when the caller has no
/// better figure. A 14-byte stream can declare a 4 GiB match.
pub fn default_output_limit(stream_len: usize) -> usize {
    stream_len
        .saturating_mul(MAX_EXPANSION)
        .max(MIN_OUTPUT_LIMIT)
}

/// Rebuild the raw bytes under [`default_output_limit`]. Highly repetitive
/// inputs past 64 MiB need [`decompress_with_limit`].
pub fn decompress(data: &[u8], params: &PassParams) -> Result<Vec<u8>, Lz4pjError> {
    decompress_with_limit(data, params, default_output_limit(data.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_err(result: Result<Vec<u8>, Lz4pjError>) -> StreamError {
        match result {
            Err(Lz4pjError::Stream(e)) => e,
            other => panic!("expected stream error, got {other:?}"),
        }
    }

    #[test]
    fn empty_stream() {
        assert_eq!(decompress(&[0, 0, 0, 0], &PassParams::MAIN).unwrap(), b"");
    }

    #[test]
    fn hand_built_run() {
        // One literal 'a', then 7 bytes copied from offset 1.
        let stream = [0, 1, b'a', 1, 0x10, 0x30, 0, 0];
        assert_eq!(
            decompress(&stream, &PassParams::MAIN).unwrap(),
            b"aaaaaaaa"
        );
    }

    #[test]
    fn long_len_escapes() {
        let mut r = ByteReader::from_slice(&[0xFF, 0xFE, 0x0B]);
        assert_eq!(r.read_long_len(15).unwrap(), 15 + 255 + 65035);
        let mut r = ByteReader::from_slice(&[0xFF, 0xFF, 0x00, 0x00, 0xFF, 0x01]);
        assert_eq!(r.read_long_len(15).unwrap(), 15 + 255 + 65281);
        let mut r = ByteReader::from_slice(&[]);
        assert_eq!(r.read_long_len(9).unwrap(), 9);
    }

    #[test]
    fn varint_overflow() {
        let mut r = ByteReader::from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert_eq!(r.read_varint(), Err(StreamError::VarintOverflow));
        let mut r = ByteReader::from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(r.read_varint(), Ok(u32::MAX));
    }

    #[test]
    fn single_byte_zero_is_256() {
        let mut r = ByteReader::from_slice(&[0, 7]);
        assert_eq!(r.read_match_offset(&PassParams::TWO_BYTE).unwrap(), 256);
        assert_eq!(r.read_match_offset(&PassParams::TWO_BYTE).unwrap(), 7);
    }

    #[test]
    fn rejects_bad_version() {
        assert_eq!(
            stream_err(decompress(&[1, 0, 0, 0], &PassParams::MAIN)),
            StreamError::UnsupportedVersion(1)
        );
    }

    #[test]
    fn rejects_offset_before_start() {
        // Offset 2 with only one byte produced.
        let stream = [0, 1, b'a', 1, 0x10, 0x00, 1, 0];
        assert_eq!(
            stream_err(decompress(&stream, &PassParams::MAIN)),
            StreamError::OffsetOutOfRange {
                offset: 2,
                position: 1
            }
        );
    }

    #[test]
    fn rejects_extra_bytes() {
        assert_eq!(
            stream_err(decompress(&[0, 0, 0, 0, 9], &PassParams::MAIN)),
            StreamError::TrailingBytes(1)
        );
    }

    #[test]
    fn rejects_literal_mismatch() {
        assert!(matches!(
            stream_err(decompress(&[0, 2, b'x', b'y', 0, 1], &PassParams::MAIN)),
            StreamError::LiteralMismatch { .. }
        ));
    }

    #[test]
    fn enforces_limit() {
        let stream = [0, 1, b'a', 1, 0x10, 0x30, 0, 0];
        assert_eq!(
            stream_err(decompress_with_limit(&stream, &PassParams::MAIN, 4)),
            StreamError::OutputLimit(4)
        );
    }

    #[test]
    fn tiny_stream_cannot_claim_gigabytes() {
        // One literal, then a dword-escaped match of about 4 GiB at offset 1.
        let stream = [
            0, 1, b'a', 1, 0x10, 0xF0, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0, 0,
        ];
        let pass = decode_stream(&stream, &PassParams::MAIN).unwrap();
        assert_eq!(pass.chunks[0].match_len, 4 + 15 + 255 + 0xFFFF_0000);
        assert_eq!(
            stream_err(decompress(&stream, &PassParams::MAIN)),
            StreamError::OutputLimit(MIN_OUTPUT_LIMIT)
        );
    }

    #[test]
    fn default_limit_scales_with_stream() {
        assert_eq!(default_output_limit(0), MIN_OUTPUT_LIMIT);
        assert_eq!(default_output_limit(1 << 20), (1 << 20) * MAX_EXPANSION);
        assert_eq!(default_output_limit(usize::MAX), usize::MAX);
    }
}
