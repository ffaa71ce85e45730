use honggfuzz::fuzz;
use lz4pj::{decompress_with_limit, PassParams};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            for params in [PassParams::MAIN, PassParams::THREE_BYTE, PassParams::TWO_BYTE] {
                let _ = decompress_with_limit(data, &params, 1 << 24);
            }
        });
    }
}
