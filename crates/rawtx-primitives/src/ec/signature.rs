//! ECDSA signature with strict DER encoding.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
///
/// Encoding always emits the low-S form. Verification accepts either form,
/// matching consensus rules which predate low-S enforcement.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(ecdsa::Signature);

impl Signature {
    /// Parse a strict DER signature (no trailing sighash byte).
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        ecdsa::Signature::from_der(bytes)
            .map(Signature)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))
    }

    /// DER encoding of the low-S form.
    pub fn to_der(&self) -> Vec<u8> {
        self.low_s().to_der().as_bytes().to_vec()
    }

    /// Sign a 32-byte digest with an RFC6979 deterministic nonce.
    pub fn sign(digest: &[u8; 32], key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let sig: ecdsa::Signature = key
            .signing_key()
            .sign_prehash(digest)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature(sig.normalize_s().unwrap_or(sig)))
    }

    /// Verify against a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], key: &PublicKey) -> bool {
        key.verifying_key().verify_prehash(digest, &self.low_s()).is_ok()
    }

    pub fn is_low_s(&self) -> bool {
        self.0.normalize_s().is_none()
    }

    fn low_s(&self) -> ecdsa::Signature {
        self.0.normalize_s().unwrap_or(self.0)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.to_der()))
    }
}
