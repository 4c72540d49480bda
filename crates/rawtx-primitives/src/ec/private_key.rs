//! secp256k1 private key with Wallet Import Format support.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a serialized private key scalar.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Suffix byte marking a WIF whose public key is serialized compressed.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 signing key plus the public key encoding it is used with.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
}

impl PrivateKey {
    /// Generate a random key that signs with a compressed public key.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
        }
    }

    /// Build a key from a 32-byte big-endian scalar.
    ///
    /// # Arguments
    /// * `bytes` - The scalar; zero and values at or above the curve order are rejected.
    /// * `compressed` - Whether the matching public key is serialized in 33-byte form.
    pub fn from_bytes(bytes: &[u8], compressed: bool) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_bytes(bytes.into())
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner, compressed })
    }

    /// Decode a WIF string, returning the key and its network prefix byte.
    ///
    /// Layout is `prefix || scalar[32] || 0x01? || checksum[4]`; a 38-byte
    /// payload marks a compressed key and a 37-byte payload an uncompressed one.
    ///
    /// # Returns
    /// `(prefix, key)` on success. The caller decides whether the prefix
    /// belongs to the active network.
    pub fn decode_wif(wif: &str) -> Result<(u8, Self), PrimitivesError> {
        let decoded = Zeroizing::new(
            bs58::decode(wif)
                .into_vec()
                .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))?,
        );

        let compressed = match decoded.len() {
            38 if decoded[33] == COMPRESS_MAGIC => true,
            38 => {
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ))
            }
            37 => false,
            n => {
                return Err(PrimitivesError::InvalidWif(format!("invalid length {}", n)));
            }
        };

        let (payload, checksum) = decoded.split_at(decoded.len() - 4);
        if sha256d(payload)[..4] != *checksum {
            return Err(PrimitivesError::ChecksumMismatch);
        }

        let key = Self::from_bytes(&payload[1..1 + PRIVATE_KEY_BYTES_LEN], compressed)?;
        Ok((payload[0], key))
    }

    /// Decode a WIF string whose prefix must equal `expected_prefix`.
    pub fn from_wif(wif: &str, expected_prefix: u8) -> Result<Self, PrimitivesError> {
        let (prefix, key) = Self::decode_wif(wif)?;
        if prefix != expected_prefix {
            return Err(PrimitivesError::InvalidWif(format!(
                "prefix 0x{:02x} does not match network prefix 0x{:02x}",
                prefix, expected_prefix
            )));
        }
        Ok(key)
    }

    /// Encode as WIF with the given network prefix byte.
    pub fn to_wif(&self, prefix: u8) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4));
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload.as_slice()).into_string()
    }

    /// The 32-byte big-endian scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// The matching public key, carrying this key's compression flag.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(*self.inner.verifying_key(), self.compressed)
    }

    /// Sign a 32-byte digest with an RFC6979 nonce; the result is low-S.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(digest, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed && self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pub_key", &self.pub_key().to_hex())
            .field("compressed", &self.compressed)
            .finish()
    }
}
