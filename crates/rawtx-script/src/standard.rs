//! Standard locking-script classification.
//!
//! `solve` matches a locking script against the fixed set of standard
//! templates and returns the template's parameters. `classify` projects
//! that onto a type name, the destinations the script pays and how many
//! signatures spending it requires.

use std::fmt;

use rawtx_primitives::hash::hash160;

use crate::opcodes::*;
use crate::script::Script;

/// Largest key count a bare multisig template may carry.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Parameters of a matched standard template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptTemplate {
    NonStandard,
    /// `<pubkey> OP_CHECKSIG`
    PubKey(Vec<u8>),
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash([u8; 20]),
    /// `OP_HASH160 <20> OP_EQUAL`
    ScriptHash([u8; 20]),
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
    MultiSig { required: usize, keys: Vec<Vec<u8>> },
    /// `OP_0 <20>`
    WitnessV0KeyHash([u8; 20]),
    /// `OP_0 <32>`
    WitnessV0ScriptHash([u8; 32]),
    /// `OP_RETURN` followed only by pushes.
    NullData,
}

/// Type name of a classified locking script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptType {
    NoDestination,
    NonStandard,
    PubKey,
    PubKeyHash,
    ScriptHash,
    MultiSig,
    NullData,
    WitnessV0KeyHash,
    WitnessV0ScriptHash,
}

impl ScriptType {
    /// Name used in decoded projections.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptType::NoDestination | ScriptType::NonStandard => "nonstandard",
            ScriptType::PubKey => "pubkey",
            ScriptType::PubKeyHash => "pubkeyhash",
            ScriptType::ScriptHash => "scripthash",
            ScriptType::MultiSig => "multisig",
            ScriptType::NullData => "nulldata",
            ScriptType::WitnessV0KeyHash => "witness_v0_keyhash",
            ScriptType::WitnessV0ScriptHash => "witness_v0_scripthash",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something an output can pay to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    KeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessKeyHash([u8; 20]),
    WitnessScriptHash([u8; 32]),
}

/// Result of classifying a locking script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub script_type: ScriptType,
    pub destinations: Vec<Destination>,
    /// Signatures needed to spend; 0 when there are no destinations.
    pub required_sigs: usize,
}

fn is_valid_pubkey(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(0x02) | Some(0x03) => bytes.len() == 33,
        Some(0x04) | Some(0x06) | Some(0x07) => bytes.len() == 65,
        _ => false,
    }
}

fn array<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}

/// Match `script` against the standard templates.
pub fn solve(script: &Script) -> ScriptTemplate {
    let b = script.as_bytes();

    if script.is_p2sh() {
        return array(&b[2..22]).map(ScriptTemplate::ScriptHash).unwrap_or(ScriptTemplate::NonStandard);
    }

    if let Some((version, program)) = script.witness_program() {
        if version == 0 {
            if let Some(h) = array::<20>(program) {
                return ScriptTemplate::WitnessV0KeyHash(h);
            }
            if let Some(h) = array::<32>(program) {
                return ScriptTemplate::WitnessV0ScriptHash(h);
            }
        }
        return ScriptTemplate::NonStandard;
    }

    if b.first() == Some(&OP_RETURN) && Script::from_bytes(&b[1..]).is_push_only() {
        return ScriptTemplate::NullData;
    }

    let chunks = match script.chunks() {
        Ok(c) => c,
        Err(_) => return ScriptTemplate::NonStandard,
    };

    match chunks.as_slice() {
        [key, last] if last.op == OP_CHECKSIG => match &key.data {
            Some(k) if is_valid_pubkey(k) => return ScriptTemplate::PubKey(k.clone()),
            _ => {}
        },
        [dup, h160, hash, eqv, cs]
            if dup.op == OP_DUP
                && h160.op == OP_HASH160
                && eqv.op == OP_EQUALVERIFY
                && cs.op == OP_CHECKSIG =>
        {
            if let Some(h) = hash.data.as_deref().and_then(array::<20>) {
                return ScriptTemplate::PubKeyHash(h);
            }
        }
        _ => {}
    }

    solve_multisig(&chunks).unwrap_or(ScriptTemplate::NonStandard)
}

fn solve_multisig(chunks: &[crate::chunk::ScriptChunk]) -> Option<ScriptTemplate> {
    let (last, rest) = chunks.split_last()?;
    if last.op != OP_CHECKMULTISIG {
        return None;
    }
    let (n_chunk, rest) = rest.split_last()?;
    let (m_chunk, key_chunks) = rest.split_first()?;
    if m_chunk.data.is_some() || n_chunk.data.is_some() {
        return None;
    }
    let required = decode_small_int(m_chunk.op)? as usize;
    let total = decode_small_int(n_chunk.op)? as usize;

    let keys = key_chunks
        .iter()
        .map(|c| c.data.clone().filter(|k| is_valid_pubkey(k)))
        .collect::<Option<Vec<_>>>()?;

    if required < 1 || required > total || keys.len() != total || total > MAX_MULTISIG_KEYS {
        return None;
    }
    Some(ScriptTemplate::MultiSig { required, keys })
}

/// Classify a locking script. Never fails.
///
/// # Arguments
/// * `script` - Any byte sequence; unparseable scripts are non-standard.
///
/// # Returns
/// The type, destinations and required signature count. An empty script is
/// `NoDestination`; null-data and non-standard scripts have no destinations.
pub fn classify(script: &Script) -> Classification {
    if script.is_empty() {
        return Classification {
            script_type: ScriptType::NoDestination,
            destinations: Vec::new(),
            required_sigs: 0,
        };
    }

    let single = |script_type, dest| Classification {
        script_type,
        destinations: vec![dest],
        required_sigs: 1,
    };

    match solve(script) {
        ScriptTemplate::PubKey(key) => single(ScriptType::PubKey, Destination::KeyHash(hash160(&key))),
        ScriptTemplate::PubKeyHash(h) => single(ScriptType::PubKeyHash, Destination::KeyHash(h)),
        ScriptTemplate::ScriptHash(h) => single(ScriptType::ScriptHash, Destination::ScriptHash(h)),
        ScriptTemplate::WitnessV0KeyHash(h) => {
            single(ScriptType::WitnessV0KeyHash, Destination::WitnessKeyHash(h))
        }
        ScriptTemplate::WitnessV0ScriptHash(h) => {
            single(ScriptType::WitnessV0ScriptHash, Destination::WitnessScriptHash(h))
        }
        ScriptTemplate::MultiSig { required, keys } => Classification {
            script_type: ScriptType::MultiSig,
            destinations: keys.iter().map(|k| Destination::KeyHash(hash160(k))).collect(),
            required_sigs: required,
        },
        ScriptTemplate::NullData => Classification {
            script_type: ScriptType::NullData,
            destinations: Vec::new(),
            required_sigs: 0,
        },
        ScriptTemplate::NonStandard => Classification {
            script_type: ScriptType::NonStandard,
            destinations: Vec::new(),
            required_sigs: 0,
        },
    }
}

// ---------------------------------------------------------------------------
// Template builders
// ---------------------------------------------------------------------------

fn push(script: &mut Script, data: &[u8]) {
    // Pushes here are at most 65 bytes, well inside the direct-push range.
    let _ = script.append_push_data(data);
}

/// Locking script paying `dest`.
pub fn script_for_destination(dest: &Destination) -> Script {
    let mut s = Script::new();
    match dest {
        Destination::KeyHash(h) => {
            s.append_opcode(OP_DUP).append_opcode(OP_HASH160);
            push(&mut s, h);
            s.append_opcode(OP_EQUALVERIFY).append_opcode(OP_CHECKSIG);
        }
        Destination::ScriptHash(h) => {
            s.append_opcode(OP_HASH160);
            push(&mut s, h);
            s.append_opcode(OP_EQUAL);
        }
        Destination::WitnessKeyHash(h) => {
            s.append_opcode(OP_0);
            push(&mut s, h);
        }
        Destination::WitnessScriptHash(h) => {
            s.append_opcode(OP_0);
            push(&mut s, h);
        }
    }
    s
}

/// `<pubkey> OP_CHECKSIG`
pub fn pubkey_script(pubkey: &[u8]) -> Script {
    let mut s = Script::new();
    push(&mut s, pubkey);
    s.append_opcode(OP_CHECKSIG);
    s
}

/// Bare m-of-n multisig; `None` when the counts are out of range.
pub fn multisig_script(required: usize, keys: &[Vec<u8>]) -> Option<Script> {
    let m = encode_small_int(u8::try_from(required).ok()?)?;
    let n = encode_small_int(u8::try_from(keys.len()).ok()?)?;
    if required == 0 || required > keys.len() {
        return None;
    }
    let mut s = Script::new();
    s.append_opcode(m);
    for key in keys {
        push(&mut s, key);
    }
    s.append_opcode(n).append_opcode(OP_CHECKMULTISIG);
    Some(s)
}

/// `OP_RETURN <payload>`; the payload is pushed verbatim with no size limit.
pub fn null_data_script(payload: &[u8]) -> Result<Script, crate::ScriptError> {
    let mut s = Script::new();
    s.append_opcode(OP_RETURN);
    s.append_push_data(payload)?;
    Ok(s)
}
