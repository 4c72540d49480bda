//! Key and script lookup for signature production.

use std::collections::HashMap;

use rawtx_primitives::ec::{PrivateKey, PublicKey};
use rawtx_primitives::hash::hash160;
use rawtx_script::Script;

use crate::SignError;

/// Source of private keys and redeem/witness scripts.
///
/// Keys are found by the HASH160 of their public key. Scripts are found
/// by their HASH160, which is both the P2SH script hash and the
/// RIPEMD-160 of a P2WSH program.
pub trait SigningProvider {
    fn get_key(&self, key_id: &[u8; 20]) -> Option<PrivateKey>;

    fn get_pubkey(&self, key_id: &[u8; 20]) -> Option<PublicKey> {
        self.get_key(key_id).map(|k| k.pub_key())
    }

    fn get_script(&self, script_id: &[u8; 20]) -> Option<Script>;
}

/// In-memory provider, used as the per-request temporary key store.
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: HashMap<[u8; 20], PrivateKey>,
    scripts: HashMap<[u8; 20], Script>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import WIF-encoded keys; any key that fails to decode or carries
    /// another network's prefix rejects the whole set.
    pub fn from_wifs<S: AsRef<str>>(wifs: &[S], secret_prefix: u8) -> Result<Self, SignError> {
        let mut store = KeyStore::new();
        for wif in wifs {
            let key = PrivateKey::from_wif(wif.as_ref(), secret_prefix)
                .map_err(|_| SignError::InvalidPrivateKey)?;
            store.add_key(key);
        }
        Ok(store)
    }

    pub fn add_key(&mut self, key: PrivateKey) {
        self.keys.insert(key.pub_key().hash160(), key);
    }

    pub fn add_script(&mut self, script: Script) {
        self.scripts.insert(hash160(script.as_bytes()), script);
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.scripts.is_empty()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("keys", &self.keys.len())
            .field("scripts", &self.scripts.len())
            .finish()
    }
}

impl SigningProvider for KeyStore {
    fn get_key(&self, key_id: &[u8; 20]) -> Option<PrivateKey> {
        self.keys.get(key_id).cloned()
    }

    fn get_script(&self, script_id: &[u8; 20]) -> Option<Script> {
        self.scripts.get(script_id).cloned()
    }
}
