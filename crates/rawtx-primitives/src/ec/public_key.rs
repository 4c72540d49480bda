//! secp256k1 public key in compressed or uncompressed SEC1 form.

use std::fmt;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

const COMPRESSED_LEN: usize = 33;
const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key that remembers its serialized form.
///
/// Scripts commit to the exact bytes of a key, so `to_bytes` and
/// `hash160` always use the encoding the key was parsed or derived with.
#[derive(Clone)]
pub struct PublicKey {
    inner: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    /// Parse a 33-byte compressed or 65-byte uncompressed SEC1 key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let compressed = match bytes.len() {
            COMPRESSED_LEN => true,
            UNCOMPRESSED_LEN => false,
            n => {
                return Err(PrimitivesError::InvalidPublicKey(format!(
                    "unexpected key length {}",
                    n
                )))
            }
        };
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner, compressed })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    /// Serialized key in its own encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_encoded_point(self.compressed).as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Hash160 of the serialized key; the key id used by pay-to-key-hash.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    /// Check `sig` over a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(digest, self)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
