use quickcheck::quickcheck;
use lz4pj::bitstream::OutBuf;
use lz4pj::decompress::ByteReader;

fn encode_pair(len1: u32, len2: u32, min_len: u32) -> Vec<u8> {
    let mut buf = [0u8; 16];
    let mut out = OutBuf::new(&mut buf);
    out.write_len_pair(len1, len2, min_len).unwrap();
    let n = out.len();
    buf[..n].to_vec()
}

fn decode_pair(bytes: &[u8], min_len: u32) -> (u32, u32, usize) {
    let mut reader = ByteReader::from_slice(bytes);
    let (a, b) = reader.read_len_pair(min_len).unwrap();
    (a, b, bytes.len() - reader.remaining())
}

#[test]
fn escape_chain_values() {
    let cases: [(u32, usize); 7] = [
        (0, 1),
        (14, 1),
        (15, 2),
        (15 + 254, 2),
        (15 + 255, 4),
        (15 + 255 + 65035, 4),
        (15 + 255 + 65280 + 1, 7),
    ];
    for (len, encoded_len) in cases {
        let bytes = encode_pair(len, 0, 0);
        assert_eq!(bytes.len(), encoded_len, "length {len}");
        assert_eq!(decode_pair(&bytes, 0), (len, 0, encoded_len), "length {len}");
    }
}

#[test]
fn largest_length() {
    let bytes = encode_pair(u32::MAX, u32::MAX, 0);
    assert_eq!(decode_pair(&bytes, 0), (u32::MAX, u32::MAX, bytes.len()));
}

quickcheck! {
    fn pair_roundtrip(len1: u32, len2: u32, min_len: u8) -> bool {
        let min_len = min_len as u32;
        let len1 = len1.saturating_add(min_len);
        let len2 = len2.saturating_add(min_len);
        let bytes = encode_pair(len1, len2, min_len);
        decode_pair(&bytes, min_len) == (len1, len2, bytes.len())
    }

    fn varint_roundtrip(value: u32) -> bool {
        let mut buf = [0u8; 5];
        let mut out = OutBuf::new(&mut buf);
        out.write_varint(value).unwrap();
        let n = out.len();
        let mut reader = ByteReader::from_slice(&buf[..n]);
        reader.read_varint() == Ok(value) && reader.remaining() == 0
    }
}
