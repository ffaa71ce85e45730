use crate::Lz4pjError;

/// Smallest offset a back-reference can carry.
pub const MIN_MATCH_OFFSET: u32 = 1;
/// `max_match_len` value meaning matches may run to the end of input.
pub const NO_MAX_MATCH_LEN: u32 = 0;
/// `max_match_offset` value meaning offsets are bounded only by position.
pub const NO_MAX_MATCH_OFFSET: u32 = 0;

/// Match-length and offset limits for one pass of the generator and writer.
///
/// None of these values are stored in the stream; a decoder has to be given
/// the same parameters the encoder used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassParams {
    /// Shortest match the generator accepts.
    pub min_match_len: u32,
    /// Longest match the generator extends to, or [`NO_MAX_MATCH_LEN`].
    pub max_match_len: u32,
    /// Largest offset the generator accepts, or [`NO_MAX_MATCH_OFFSET`].
    pub max_match_offset: u32,
}

impl PassParams {
    /// Wide-range pass over the raw input.
    pub const MAIN: PassParams = PassParams {
        min_match_len: 4,
        max_match_len: NO_MAX_MATCH_LEN,
        max_match_offset: NO_MAX_MATCH_OFFSET,
    };

    /// Fixed 3-byte matches within 256 bytes, run over the main pass residue.
    pub const THREE_BYTE: PassParams = PassParams {
        min_match_len: 3,
        max_match_len: 3,
        max_match_offset: 256,
    };

    /// Fixed 2-byte matches within 256 bytes, run over the main pass residue.
    pub const TWO_BYTE: PassParams = PassParams {
        min_match_len: 2,
        max_match_len: 2,
        max_match_offset: 256,
    };

    /// Build and validate a parameter set.
    pub fn new(
        min_match_len: u32,
        max_match_len: u32,
        max_match_offset: u32,
    ) -> Result<Self, Lz4pjError> {
        let params = Self {
            min_match_len,
            max_match_len,
            max_match_offset,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the length limits. [`crate::generate`] runs this on every call.
    pub fn validate(&self) -> Result<(), Lz4pjError> {
        let (min, max) = (self.min_match_len, self.max_match_len);
        if min < 2 {
            return Err(Lz4pjError::Config(format!(
                "min_match_len must be at least 2, got {min}"
            )));
        }
        if max != NO_MAX_MATCH_LEN && max < min {
            return Err(Lz4pjError::Config(format!(
                "max_match_len {max} is below min_match_len {min}"
            )));
        }
        Ok(())
    }

    /// Every match has the same length, so match lengths are not written.
    pub fn is_fixed_length(&self) -> bool {
        self.min_match_len == self.max_match_len
    }

    /// Offsets fit a single raw byte instead of a varint.
    pub fn single_byte_offsets(&self) -> bool {
        self.max_match_offset != NO_MAX_MATCH_OFFSET
            && self.max_match_offset - MIN_MATCH_OFFSET < 256
    }

    pub fn accepts_offset(&self, offset: u32) -> bool {
        offset >= MIN_MATCH_OFFSET
            && (self.max_match_offset == NO_MAX_MATCH_OFFSET || offset <= self.max_match_offset)
    }
}

impl Default for PassParams {
    fn default() -> Self {
        Self::MAIN
    }
}

/// Runtime configuration for the pass orchestrator.
#[derive(Debug, Clone)]
pub struct Config {
    /// Run the two narrow-range passes over the main pass residue and report
    /// their sizes. They never change the returned stream.
    pub residue_passes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            residue_passes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for p in [PassParams::MAIN, PassParams::THREE_BYTE, PassParams::TWO_BYTE] {
            assert_eq!(
                PassParams::new(p.min_match_len, p.max_match_len, p.max_match_offset).unwrap(),
                p
            );
        }
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(PassParams::new(1, 0, 0).is_err());
        assert!(PassParams::new(4, 3, 0).is_err());
    }

    #[test]
    fn validate_catches_literal_params() {
        let zero = PassParams {
            min_match_len: 0,
            max_match_len: 0,
            max_match_offset: 0,
        };
        assert!(matches!(zero.validate(), Err(Lz4pjError::Config(_))));
        assert!(PassParams::MAIN.validate().is_ok());
    }

    #[test]
    fn offset_width_selection() {
        assert!(!PassParams::MAIN.single_byte_offsets());
        assert!(PassParams::THREE_BYTE.single_byte_offsets());
        assert!(!PassParams::new(2, 2, 257).unwrap().single_byte_offsets());
        assert!(PassParams::new(2, 2, 16).unwrap().single_byte_offsets());
    }

    #[test]
    fn offset_cap() {
        assert!(PassParams::TWO_BYTE.accepts_offset(256));
        assert!(!PassParams::TWO_BYTE.accepts_offset(257));
        assert!(!PassParams::MAIN.accepts_offset(0));
        assert!(PassParams::MAIN.accepts_offset(u32::MAX));
    }
}
