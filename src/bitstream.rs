//! Serializer for one pass.
//!
//! Stream layout, all fields byte aligned:
//!
//! ```text
//! [version=0][n_lits: varint][lits][n_chunks: varint]
//! [literal length pairs][match length pairs, unless fixed length]
//! [offsets][trailing literal length: varint]
//! ```
//!
//! * **varint** – little-endian base-128, high bit set while more groups follow.
//! * **length pair** – one byte holding two 4-bit nibbles (`len - min_len`,
//!   capped at 15) followed by the overflow of the first value, then of the
//!   second. Overflow of a saturated nibble is one byte if below 255,
//!   otherwise `0xFF` and a big-endian `u16`, or `0xFF 0xFF` and a
//!   big-endian `u32` once the word would reach `0xFF00`.
//! * **offset** – one raw byte when the pass caps offsets at 256 or less
//!   (256 is written as `0`), otherwise `offset - 1` as a varint.

use tracing::debug;

use crate::chunk::ParsedPass;
use crate::config::{PassParams, MIN_MATCH_OFFSET};
use crate::Lz4pjError;

/// Format version written as the first byte.
pub const VERSION: u8 = 0;
/// Largest value a length nibble holds; it also marks "overflow follows".
pub const NIBBLE_MAX: u32 = 15;
/// Escape byte for the overflow cascade.
pub const ESCAPE: u8 = 0xFF;
/// Overflow values from here on use the 32-bit form.
pub const WORD_LIMIT: u32 = 255 * 256;
/// Longest varint of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;
/// Longest overflow sequence of a single length.
pub const MAX_LONG_LEN_BYTES: usize = 6;

/// Bounds-checked cursor over a caller-provided destination.
pub struct OutBuf<'a> {
    buf: &'a mut [u8],
    index: usize,
}

impl<'a> OutBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, index: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    fn claim(&mut self, n: usize) -> Result<&mut [u8], Lz4pjError> {
        let needed = self.index + n;
        if needed > self.buf.len() {
            return Err(Lz4pjError::BufferOverflow {
                needed,
                capacity: self.buf.len(),
            });
        }
        let slot = &mut self.buf[self.index..needed];
        self.index = needed;
        Ok(slot)
    }

    pub fn out(&mut self, byte: u8) -> Result<(), Lz4pjError> {
        self.claim(1)?[0] = byte;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Lz4pjError> {
        self.claim(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Little-endian base-128 varint. Zero is a single `0x00`.
    pub fn write_varint(&mut self, mut value: u32) -> Result<(), Lz4pjError> {
        loop {
            let low = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                return self.out(low);
            }
            self.out(low | 0x80)?;
        }
    }

    /// Overflow bytes for a length whose nibble saturated. `len` is the
    /// value after subtracting the pass minimum; nothing is written below 15.
    pub fn write_long_len(&mut self, len: u32) -> Result<(), Lz4pjError> {
        if len < NIBBLE_MAX {
            return Ok(());
        }
        let mut len = len - NIBBLE_MAX;
        if len < ESCAPE as u32 {
            return self.out(len as u8);
        }
        self.out(ESCAPE)?;
        len -= ESCAPE as u32;
        if len < WORD_LIMIT {
            self.write_bytes(&(len as u16).to_be_bytes())
        } else {
            self.out(ESCAPE)?;
            self.write_bytes(&len.to_be_bytes())
        }
    }

    /// Nibble byte for two lengths followed by their overflow bytes.
    pub fn write_len_pair(&mut self, len1: u32, len2: u32, min_len: u32) -> Result<(), Lz4pjError> {
        let len1 = reduce(len1, min_len)?;
        let len2 = reduce(len2, min_len)?;
        let nibble1 = len1.min(NIBBLE_MAX) as u8;
        let nibble2 = len2.min(NIBBLE_MAX) as u8;
        self.out((nibble1 << 4) | nibble2)?;
        self.write_long_len(len1)?;
        self.write_long_len(len2)
    }

    /// Lengths two at a time; an odd count pads with `min_len`, which
    /// reduces to a zero nibble with no overflow.
    pub fn write_lens<I>(&mut self, lens: I, min_len: u32) -> Result<(), Lz4pjError>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut lens = lens.into_iter();
        while let Some(first) = lens.next() {
            let second = lens.next().unwrap_or(min_len);
            self.write_len_pair(first, second, min_len)?;
        }
        Ok(())
    }

    pub fn write_match_offset(&mut self, offset: u32, params: &PassParams) -> Result<(), Lz4pjError> {
        if params.single_byte_offsets() {
            self.out(offset as u8)
        } else {
            let stored = offset
                .checked_sub(MIN_MATCH_OFFSET)
                .ok_or_else(|| Lz4pjError::Internal("match offset 0".into()))?;
            self.write_varint(stored)
        }
    }
}

fn reduce(len: u32, min_len: u32) -> Result<u32, Lz4pjError> {
    len.checked_sub(min_len)
        .ok_or_else(|| Lz4pjError::Internal(format!("length {len} is below minimum {min_len}")))
}

fn bound_for(literals: usize, chunks: usize) -> usize {
    1 + 3 * MAX_VARINT_LEN
        + literals
        + 2 * ((chunks + 1) / 2)
        + chunks * (2 * MAX_LONG_LEN_BYTES + MAX_VARINT_LEN)
}

/// Upper bound on the serialized size of any input of `raw_len` bytes.
///
/// Every chunk consumes at least `min_match_len` input bytes, which bounds
/// the chunk count; each chunk then costs at most a nibble byte share, two
/// overflow sequences and one varint offset.
pub fn max_compressed_len(raw_len: usize, params: &PassParams) -> usize {
    bound_for(raw_len, raw_len / params.min_match_len.max(1) as usize)
}

fn check_pass(pass: &ParsedPass, params: &PassParams) -> Result<(), Lz4pjError> {
    if pass.literal_total() != pass.literals.len() as u64 {
        return Err(Lz4pjError::Internal(format!(
            "chunks reference {} literal bytes but the buffer holds {}",
            pass.literal_total(),
            pass.literals.len()
        )));
    }
    for chunk in &pass.chunks {
        if params.is_fixed_length() && chunk.match_len != params.min_match_len {
            return Err(Lz4pjError::Internal(format!(
                "match length {} in a fixed {}-byte pass",
                chunk.match_len, params.min_match_len
            )));
        }
        if !params.accepts_offset(chunk.match_offset) {
            return Err(Lz4pjError::Internal(format!(
                "match offset {} outside the pass range",
                chunk.match_offset
            )));
        }
    }
    Ok(())
}

/// Write `pass` to `out` in the stream layout described above.
pub fn write_pass(out: &mut OutBuf, pass: &ParsedPass, params: &PassParams) -> Result<(), Lz4pjError> {
    check_pass(pass, params)?;
    let n_lits = u32::try_from(pass.literals.len())
        .map_err(|_| Lz4pjError::InputTooLarge(pass.literals.len()))?;
    let n_chunks = u32::try_from(pass.chunks.len())
        .map_err(|_| Lz4pjError::InputTooLarge(pass.chunks.len()))?;

    out.out(VERSION)?;

    out.write_varint(n_lits)?;
    out.write_bytes(&pass.literals)?;
    debug!(len = out.len(), "after literals");

    out.write_varint(n_chunks)?;
    out.write_lens(pass.chunks.iter().map(|c| c.literal_len), 0)?;
    debug!(len = out.len(), "after literal lengths");

    if !params.is_fixed_length() {
        out.write_lens(pass.chunks.iter().map(|c| c.match_len), params.min_match_len)?;
        debug!(len = out.len(), "after match lengths");
    }

    for chunk in &pass.chunks {
        out.write_match_offset(chunk.match_offset, params)?;
    }
    debug!(len = out.len(), "after match offsets");

    out.write_varint(pass.trailing_len)
}

/// Serialize into `dst`, returning the number of bytes written.
pub fn serialize_into(pass: &ParsedPass, params: &PassParams, dst: &mut [u8]) -> Result<usize, Lz4pjError> {
    let mut out = OutBuf::new(dst);
    write_pass(&mut out, pass, params)?;
    Ok(out.len())
}

/// Serialize into a freshly allocated buffer sized to the worst case.
pub fn serialize(pass: &ParsedPass, params: &PassParams) -> Result<Vec<u8>, Lz4pjError> {
    let bound = bound_for(pass.literals.len(), pass.chunks.len());
    let mut buf = Vec::new();
    buf.try_reserve_exact(bound)
        .map_err(|e| Lz4pjError::AllocationFailure(format!("{bound} byte output buffer: {e}")))?;
    buf.resize(bound, 0);
    let len = serialize_into(pass, params, &mut buf)?;
    buf.truncate(len);
    Ok(buf)
}
