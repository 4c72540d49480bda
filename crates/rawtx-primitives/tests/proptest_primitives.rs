use proptest::prelude::*;

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::ec::PrivateKey;
use rawtx_primitives::hash::sha256d;
use rawtx_primitives::util::{VarInt, WireReader, WireWriter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wif_preserves_scalar_and_compression(
        seed in prop::array::uniform32(any::<u8>()),
        compressed in any::<bool>(),
    ) {
        // Zero and out-of-range scalars are not keys.
        if let Ok(key) = PrivateKey::from_bytes(&seed, compressed) {
            let (prefix, back) = PrivateKey::decode_wif(&key.to_wif(0xef)).expect("decode");
            prop_assert_eq!(prefix, 0xef);
            prop_assert_eq!(back.to_bytes(), seed);
            prop_assert_eq!(back.is_compressed(), compressed);
            let expected_len = if compressed { 33 } else { 65 };
            prop_assert_eq!(back.pub_key().to_bytes().len(), expected_len);
        }
    }

    #[test]
    fn signatures_verify_under_own_key(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        if let Ok(key) = PrivateKey::from_bytes(&seed, true) {
            let digest = sha256d(&msg);
            let sig = key.sign(&digest).expect("sign");
            prop_assert!(sig.is_low_s());
            prop_assert!(key.pub_key().verify(&digest, &sig));
        }
    }

    #[test]
    fn hash_display_parses_back(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(Hash::from_hex_exact(&hash.to_string()).expect("parse"), hash);
    }

    #[test]
    fn varint_length_matches_encoding(v in any::<u64>()) {
        let mut w = WireWriter::new();
        w.write_varint(VarInt(v));
        prop_assert_eq!(w.len(), VarInt(v).length());
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        prop_assert_eq!(r.read_varint().expect("decode").value(), v);
    }
}
