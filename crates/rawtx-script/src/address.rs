/// Address text codec.
///
/// Key-hash and script-hash destinations use Base58Check with a
/// per-network version byte; witness destinations use bech32 segwit v0
/// with a per-network human-readable part.

use std::fmt;

use bech32::{hrp, segwit, Fe32, Hrp};
use serde::{Deserialize, Serialize};

use rawtx_primitives::hash::sha256d;

use crate::standard::Destination;
use crate::ScriptError;

/// Chain an address or key belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

/// Version bytes and prefixes for one network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressParams {
    pub pubkey_hash_prefix: u8,
    pub script_hash_prefix: u8,
    pub secret_key_prefix: u8,
    pub bech32_hrp: Hrp,
}

impl Network {
    pub fn params(&self) -> AddressParams {
        match self {
            Network::Mainnet => AddressParams {
                pubkey_hash_prefix: 0x00,
                script_hash_prefix: 0x05,
                secret_key_prefix: 0x80,
                bech32_hrp: hrp::BC,
            },
            Network::Testnet => AddressParams {
                pubkey_hash_prefix: 0x6f,
                script_hash_prefix: 0xc4,
                secret_key_prefix: 0xef,
                bech32_hrp: hrp::TB,
            },
            Network::Regtest => AddressParams {
                pubkey_hash_prefix: 0x6f,
                script_hash_prefix: 0xc4,
                secret_key_prefix: 0xef,
                bech32_hrp: hrp::BCRT,
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

/// Conversion between address text and destinations.
pub trait AddressCodec {
    /// Parse address text; `None` when it is not a valid address for this codec.
    fn classify_address(&self, text: &str) -> Option<Destination>;

    /// Render a destination as address text.
    fn render_address(&self, dest: &Destination) -> Result<String, ScriptError>;
}

/// Base58Check + bech32 codec bound to one network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardAddressCodec {
    network: Network,
}

impl StandardAddressCodec {
    pub fn new(network: Network) -> Self {
        StandardAddressCodec { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    fn decode_base58(&self, text: &str) -> Option<Destination> {
        let decoded = bs58::decode(text).into_vec().ok()?;
        if decoded.len() != 25 {
            return None;
        }
        let (payload, checksum) = decoded.split_at(21);
        if sha256d(payload)[..4] != *checksum {
            return None;
        }
        let hash: [u8; 20] = payload[1..].try_into().ok()?;
        let params = self.network.params();
        if payload[0] == params.pubkey_hash_prefix {
            Some(Destination::KeyHash(hash))
        } else if payload[0] == params.script_hash_prefix {
            Some(Destination::ScriptHash(hash))
        } else {
            None
        }
    }

    fn decode_bech32(&self, text: &str) -> Option<Destination> {
        let (hrp, version, program) = segwit::decode(text).ok()?;
        if hrp != self.network.params().bech32_hrp || version != Fe32::Q {
            return None;
        }
        match program.len() {
            20 => program.try_into().ok().map(Destination::WitnessKeyHash),
            32 => program.try_into().ok().map(Destination::WitnessScriptHash),
            _ => None,
        }
    }
}

fn encode_base58(prefix: u8, hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(25);
    payload.push(prefix);
    payload.extend_from_slice(hash);
    let checksum = sha256d(&payload);
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

impl AddressCodec for StandardAddressCodec {
    fn classify_address(&self, text: &str) -> Option<Destination> {
        self.decode_base58(text).or_else(|| self.decode_bech32(text))
    }

    fn render_address(&self, dest: &Destination) -> Result<String, ScriptError> {
        let params = self.network.params();
        let witness = |program: &[u8]| {
            segwit::encode_v0(params.bech32_hrp, program)
                .map_err(|e| ScriptError::InvalidAddress(e.to_string()))
        };
        match dest {
            Destination::KeyHash(h) => Ok(encode_base58(params.pubkey_hash_prefix, h)),
            Destination::ScriptHash(h) => Ok(encode_base58(params.script_hash_prefix, h)),
            Destination::WitnessKeyHash(h) => witness(h),
            Destination::WitnessScriptHash(h) => witness(h),
        }
    }
}
