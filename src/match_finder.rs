//! Most-recent-occurrence index for 2-byte keys.
//!
//! One slot per possible byte pair. A new occurrence overwrites the slot, so
//! only the latest prior position of a pair is ever offered as a candidate.

/// Number of distinct 2-byte keys.
pub const TABLE_SIZE: usize = 1 << 16;

/// Slot value for "pair not seen yet". Input lengths are capped below
/// `u32::MAX`, so no real position can collide with it.
const NO_POSITION: u32 = u32::MAX;

pub struct MatchFinder {
    last_seen: Box<[u32]>,
}

impl MatchFinder {
    pub fn new() -> Self {
        Self {
            last_seen: vec![NO_POSITION; TABLE_SIZE].into_boxed_slice(),
        }
    }

    /// Big-endian key of `raw[index]` and `raw[index + 1]`.
    #[inline]
    pub fn byte_pair(raw: &[u8], index: usize) -> u16 {
        u16::from_be_bytes([raw[index], raw[index + 1]])
    }

    /// Return the last recorded position of `pair` and record `position` in
    /// its place.
    #[inline]
    pub fn lookup_and_update(&mut self, pair: u16, position: u32) -> Option<u32> {
        let prev = std::mem::replace(&mut self.last_seen[pair as usize], position);
        (prev != NO_POSITION).then_some(prev)
    }

    /// Record `position` without looking at the previous value.
    #[inline]
    pub fn record(&mut self, pair: u16, position: u32) {
        self.last_seen[pair as usize] = position;
    }
}

impl Default for MatchFinder {
    fn default() -> Self {
        Self::new()
    }
}
