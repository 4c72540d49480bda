//! 32-byte chain hash used for txids, wtxids, block hashes and merkle nodes.
//!
//! Bytes are stored in internal (wire) order and rendered as byte-reversed
//! hex, which is how block explorers and RPC clients expect to see them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a Hash in bytes.
pub const HASH_SIZE: usize = 32;

/// Length of the display form of a Hash.
pub const HASH_HEX_LEN: usize = HASH_SIZE * 2;

/// A 32-byte hash in internal byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Wrap 32 bytes given in internal order.
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Build a Hash from a slice that must be exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            ))
        })?;
        Ok(Hash(arr))
    }

    /// Parse the byte-reversed display form.
    ///
    /// Short strings are zero-padded on the high end, so `"1"` parses to a
    /// hash whose first internal byte is `0x01`. Use [`Hash::from_hex_exact`]
    /// where a full 64-character identifier is required.
    ///
    /// # Arguments
    /// * `hex_str` - Up to 64 hex characters.
    ///
    /// # Returns
    /// The parsed `Hash`, or an error for oversize or non-hex input.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() > HASH_HEX_LEN {
            return Err(PrimitivesError::InvalidHash(format!(
                "max hash string length is {} characters",
                HASH_HEX_LEN
            )));
        }
        let padded = if hex_str.len() % 2 != 0 {
            format!("0{}", hex_str)
        } else {
            hex_str.to_string()
        };
        let decoded = hex::decode(&padded)?;

        let mut bytes = [0u8; HASH_SIZE];
        for (slot, b) in bytes.iter_mut().zip(decoded.iter().rev()) {
            *slot = *b;
        }
        Ok(Hash(bytes))
    }

    /// Parse a display-form hash that must be exactly 64 hex characters.
    pub fn from_hex_exact(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() != HASH_HEX_LEN || !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PrimitivesError::InvalidHash(format!(
                "expected {} hex characters",
                HASH_HEX_LEN
            )));
        }
        Hash::from_hex(hex_str)
    }

    /// Double SHA-256 of `data` as a Hash.
    pub fn sha256d(data: &[u8]) -> Self {
        Hash(sha256d(data))
    }

    /// Borrow the internal bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Copy out the internal bytes.
    pub fn to_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// True for the all-zero hash, which marks a coinbase outpoint.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
