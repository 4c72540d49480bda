//! Digest functions used by the wire format and script templates.
//!
//! Transaction ids, block hashes and merkle nodes use SHA-256d. Key and
//! script hashes use Hash160 (RIPEMD-160 over SHA-256).

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Double SHA-256, the hash behind txids, block hashes and signature digests.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of `data`.
///
/// A version 0 witness script hash program is 32 bytes; its RIPEMD-160
/// equals the Hash160 of the witness script, which is the key the script
/// lookup uses.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash160: RIPEMD-160(SHA-256(data)).
///
/// # Arguments
/// * `data` - Public key or script bytes.
///
/// # Returns
/// The 20-byte identifier used in pay-to-key-hash and pay-to-script-hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"this is the data I want to hash";

    #[test]
    fn test_empty_input_digests() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
        assert_eq!(hex::encode(ripemd160(b"")), "9c1185a5c5e9fc54612808977ee8f548b2258d31");
        assert_eq!(hex::encode(hash160(b"")), "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb");
    }

    #[test]
    fn test_payload_digests() {
        assert_eq!(
            hex::encode(sha256(PAYLOAD)),
            "f88eec7ecabf88f9a64c4100cac1e0c0c4581100492137d1b656ea626cad63e3"
        );
        assert_eq!(
            hex::encode(sha256d(PAYLOAD)),
            "2209ddda5914a3fbad507ff2284c4b6e559c18a669f9fc3ad3b5826a2a999d58"
        );
        assert_eq!(hex::encode(hash160(PAYLOAD)), "e7fb13ef86fef4203f042fbfc2703fa628301e90");
    }

    #[test]
    fn test_witness_program_lookup_key_matches_hash160() {
        let script = [0x51u8, 0x21, 0x02, 0xab, 0x52, 0xae];
        let program = sha256(&script);
        assert_eq!(ripemd160(&program), hash160(&script));
    }
}
