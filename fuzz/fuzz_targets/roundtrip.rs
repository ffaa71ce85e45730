use honggfuzz::fuzz;
use lz4pj::{compress, decompress, PassParams};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let compressed = compress(data).expect("compression failed");
            let output = decompress(&compressed, &PassParams::MAIN).expect("decode failed");
            assert_eq!(output, data);
        });
    }
}
