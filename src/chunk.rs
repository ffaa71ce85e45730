//! Greedy conversion of raw bytes into literal-run/match chunks.

use tracing::debug;

use crate::config::PassParams;
use crate::match_finder::MatchFinder;
use crate::Lz4pjError;

/// One decoding step: copy `literal_len` bytes from the literal buffer, then
/// copy `match_len` bytes from `match_offset` bytes back in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub literal_len: u32,
    pub match_len: u32,
    pub match_offset: u32,
}

/// Result of one generation scan: the chunk list, the shared literal buffer
/// and the length of the literal run after the last chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPass {
    pub chunks: Vec<Chunk>,
    pub literals: Vec<u8>,
    pub trailing_len: u32,
}

impl ParsedPass {
    /// Empty pass with room for every byte of `raw_len` to become a
    /// literal. Chunks are pushed as they are found.
    fn for_input(raw_len: usize) -> Result<Self, Lz4pjError> {
        let mut literals = Vec::new();
        literals.try_reserve_exact(raw_len).map_err(|e| {
            Lz4pjError::AllocationFailure(format!("{raw_len} byte literal buffer: {e}"))
        })?;
        Ok(Self {
            chunks: Vec::new(),
            literals,
            trailing_len: 0,
        })
    }

    /// Number of raw bytes this pass describes.
    pub fn covered_len(&self) -> u64 {
        self.chunks
            .iter()
            .map(|c| c.literal_len as u64 + c.match_len as u64)
            .sum::<u64>()
            + self.trailing_len as u64
    }

    /// Literal bytes referenced by the chunks and the trailing run.
    pub fn literal_total(&self) -> u64 {
        self.chunks.iter().map(|c| c.literal_len as u64).sum::<u64>() + self.trailing_len as u64
    }
}

/// Length of the common run at `raw[index..]` and `raw[match_index..]`,
/// capped at `max_len` unless it is zero.
fn match_len(raw: &[u8], index: usize, match_index: usize, max_len: u32) -> usize {
    let mut limit = raw.len() - index;
    if max_len != 0 {
        limit = limit.min(max_len as usize);
    }
    raw[index..index + limit]
        .iter()
        .zip(&raw[match_index..])
        .take_while(|(a, b)| a == b)
        .count()
}

/// Scan `raw` once, left to right, accepting the first candidate match that
/// is at least `params.min_match_len` long.
pub fn generate(raw: &[u8], params: &PassParams) -> Result<ParsedPass, Lz4pjError> {
    params.validate()?;
    let raw_len = raw.len();
    if raw_len >= u32::MAX as usize {
        return Err(Lz4pjError::InputTooLarge(raw_len));
    }

    let mut pass = ParsedPass::for_input(raw_len)?;
    if raw_len == 0 {
        return Ok(pass);
    }

    let mut finder = MatchFinder::new();
    let mut run_start = 0usize;
    let mut index = 0usize;

    while index + 1 < raw_len {
        let pair = MatchFinder::byte_pair(raw, index);
        let found = finder
            .lookup_and_update(pair, index as u32)
            .map(|p| p as usize)
            .filter(|&p| p < index && params.accepts_offset((index - p) as u32))
            .map(|p| (p, match_len(raw, index, p, params.max_match_len)));

        match found {
            Some((match_index, len)) if len >= params.min_match_len as usize => {
                pass.chunks.push(Chunk {
                    literal_len: (index - run_start) as u32,
                    match_len: len as u32,
                    match_offset: (index - match_index) as u32,
                });

                // Keep indexing inside the match so later matches can point into it.
                let end = index + len;
                for skipped in index + 1..end.min(raw_len - 1) {
                    finder.record(MatchFinder::byte_pair(raw, skipped), skipped as u32);
                }
                index = end;
                run_start = end;
            }
            _ => {
                pass.literals.push(raw[index]);
                index += 1;
            }
        }
    }

    // The pair scan never starts at the final byte.
    if index < raw_len {
        pass.literals.push(raw[index]);
    }
    pass.trailing_len = (raw_len - run_start) as u32;

    debug!(
        chunks = pass.chunks.len(),
        literals = pass.literals.len(),
        trailing = pass.trailing_len,
        "generated chunks"
    );

    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let pass = generate(&[], &PassParams::MAIN).unwrap();
        assert_eq!(pass, ParsedPass::default());
    }

    #[test]
    fn single_byte_is_trailing() {
        let pass = generate(b"z", &PassParams::MAIN).unwrap();
        assert!(pass.chunks.is_empty());
        assert_eq!(pass.literals, b"z");
        assert_eq!(pass.trailing_len, 1);
    }

    #[test]
    fn run_of_equal_bytes() {
        let pass = generate(b"aaaaaaaa", &PassParams::MAIN).unwrap();
        assert_eq!(
            pass.chunks,
            vec![Chunk {
                literal_len: 1,
                match_len: 7,
                match_offset: 1
            }]
        );
        assert_eq!(pass.literals, b"a");
        assert_eq!(pass.trailing_len, 0);
    }

    #[test]
    fn short_repeat_stays_literal() {
        // "abc" repeats but is shorter than the main pass minimum.
        let pass = generate(b"abcXabcY", &PassParams::MAIN).unwrap();
        assert!(pass.chunks.is_empty());
        assert_eq!(pass.literals, b"abcXabcY");
        assert_eq!(pass.trailing_len, 8);
    }

    #[test]
    fn match_then_trailing_run() {
        let pass = generate(b"abcdXabcdYZ", &PassParams::MAIN).unwrap();
        assert_eq!(
            pass.chunks,
            vec![Chunk {
                literal_len: 5,
                match_len: 4,
                match_offset: 5
            }]
        );
        assert_eq!(pass.literals, b"abcdXYZ");
        assert_eq!(pass.trailing_len, 2);
        assert_eq!(pass.covered_len(), 11);
    }

    #[test]
    fn fixed_length_pass_caps_match() {
        let pass = generate(b"abcabcabc", &PassParams::THREE_BYTE).unwrap();
        assert!(pass.chunks.iter().all(|c| c.match_len == 3));
        assert_eq!(pass.covered_len(), 9);
    }

    #[test]
    fn offset_cap_rejects_distant_match() {
        let mut raw = b"abc".to_vec();
        raw.extend((0..300).map(|i| (i % 200) as u8 + 50));
        raw.extend_from_slice(b"abc");
        let pass = generate(&raw, &PassParams::THREE_BYTE).unwrap();
        assert!(pass.chunks.iter().all(|c| c.match_offset <= 256));
        assert_eq!(pass.covered_len(), raw.len() as u64);
    }

    #[test]
    fn matches_can_reference_skipped_region() {
        // "bc" at 7 is only recorded while skipping the first match.
        let pass = generate(b"abcdeXabcdeYbcde", &PassParams::MAIN).unwrap();
        assert_eq!(
            pass.chunks[1],
            Chunk {
                literal_len: 1,
                match_len: 4,
                match_offset: 5
            }
        );
        assert_eq!(pass.trailing_len, 0);
    }

    #[test]
    fn match_free_input_holds_no_chunk_storage() {
        // De Bruijn order: no byte pair occurs twice, so nothing can match.
        let mut raw = Vec::with_capacity(1 << 16);
        for a in 0..=255u8 {
            raw.push(a);
            for b in a as u16 + 1..256 {
                raw.extend_from_slice(&[a, b as u8]);
            }
        }
        assert_eq!(raw.len(), 1 << 16);
        let pass = generate(&raw, &PassParams::MAIN).unwrap();
        assert!(pass.chunks.is_empty());
        assert_eq!(pass.chunks.capacity(), 0);
        assert_eq!(pass.literals.len(), raw.len());
    }

    #[test]
    fn unchecked_params_are_a_config_error() {
        let params = PassParams {
            min_match_len: 0,
            max_match_len: 0,
            max_match_offset: 0,
        };
        assert!(matches!(
            generate(b"abcdabcdabcd", &params),
            Err(Lz4pjError::Config(_))
        ));
    }
}
