/// Script type: a byte sequence of opcodes and data pushes.
///
/// Locking scripts sit on outputs and unlocking scripts on inputs. The
/// bytes are kept verbatim so that encoding a decoded script reproduces
/// the original exactly, even when it does not parse.

use std::fmt;

use crate::chunk::{decode_script, encode_stack_element, push_data_prefix, read_chunk, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// A script, stored as raw bytes.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Parse a space-separated asm string.
    ///
    /// Tokens are opcode names (with or without `OP_`), decimal integers
    /// (pushed as script numbers, `-1`..=`16` as single opcodes) or hex
    /// data pushes.
    ///
    /// # Arguments
    /// * `asm` - e.g. `"OP_DUP OP_HASH160 89ab... OP_EQUALVERIFY OP_CHECKSIG"`.
    ///
    /// # Returns
    /// The assembled `Script`, or an error for a token that is none of the above.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            if token.starts_with("OP_") {
                let op = opcode_from_name(token)
                    .ok_or_else(|| ScriptError::InvalidScript(format!("unknown opcode {}", token)))?;
                script.append_opcode(op);
            } else if let Some(n) = parse_decimal(token) {
                script.append_int(n)?;
            } else {
                let data = hex::decode(token).map_err(|_| ScriptError::InvalidOpcodeData)?;
                script.append_push_data(&data)?;
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Human-readable assembly.
    ///
    /// Pushes of up to 4 bytes render as decimal script numbers, longer
    /// pushes as hex, other opcodes by name. A truncated push renders as
    /// `[error]` and ends the output.
    pub fn to_asm(&self) -> String {
        self.render_asm(false)
    }

    /// Assembly for unlocking scripts: a push that is a strictly encoded
    /// DER signature with a defined sighash byte renders the byte by name,
    /// e.g. `3044...01` becomes `3044...[ALL]`.
    pub fn to_asm_decoding_sighash(&self) -> String {
        self.render_asm(true)
    }

    fn render_asm(&self, decode_sighash: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut pos = 0;
        while pos < self.0.len() {
            let chunk = match read_chunk(&self.0, &mut pos) {
                Ok(c) => c,
                Err(_) => {
                    parts.push("[error]".to_string());
                    break;
                }
            };
            let data = match chunk.data {
                Some(d) => d,
                None => {
                    parts.push(opcode_name(chunk.op));
                    continue;
                }
            };
            if data.len() <= 4 {
                parts.push(script_num_decode(&data).to_string());
            } else if decode_sighash && !self.is_unspendable() && is_strict_signature(&data) {
                let (sig, hash_type) = data.split_at(data.len() - 1);
                match sighash_name(hash_type[0]) {
                    Some(name) => parts.push(format!("{}[{}]", hex::encode(sig), name)),
                    None => parts.push(hex::encode(&data)),
                }
            } else {
                parts.push(hex::encode(&data));
            }
        }
        parts.join(" ")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Shape checks
    // -----------------------------------------------------------------------

    /// OP_HASH160 <20 bytes> OP_EQUAL, matched byte-for-byte.
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// Split a witness program into `(version, program)`.
    ///
    /// A witness program is a small-int version opcode followed by a single
    /// direct push of 2 to 40 bytes, and nothing else.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let b = &self.0;
        if b.len() < 4 || b.len() > 42 {
            return None;
        }
        let version = decode_small_int(b[0])?;
        if b[1] as usize + 2 != b.len() {
            return None;
        }
        Some((version, &b[2..]))
    }

    /// True when every operation is a push (`OP_16` and below, including `OP_1NEGATE`).
    pub fn is_push_only(&self) -> bool {
        match self.chunks() {
            Ok(chunks) => chunks.iter().all(|c| c.op <= OP_16),
            Err(_) => false,
        }
    }

    /// A script starting with OP_RETURN can never be satisfied.
    pub fn is_unspendable(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// The stack a push-only script leaves behind.
    ///
    /// `OP_1NEGATE` pushes `[0x81]` and `OP_N` pushes `[N]`. Returns `None`
    /// when the script contains a non-push operation or does not parse.
    pub fn push_stack(&self) -> Option<Vec<Vec<u8>>> {
        let mut stack = Vec::new();
        for chunk in self.chunks().ok()? {
            match chunk.data {
                Some(data) => stack.push(data),
                None if chunk.op == OP_1NEGATE => stack.push(vec![0x81]),
                None => stack.push(vec![decode_small_int(chunk.op)?]),
            }
        }
        Some(stack)
    }

    /// Encode a stack as a push-only script.
    pub fn from_push_stack(stack: &[Vec<u8>]) -> Result<Self, ScriptError> {
        let mut bytes = Vec::new();
        for element in stack {
            bytes.extend(encode_stack_element(element)?);
        }
        Ok(Script(bytes))
    }

    /// Copy of the script with every OP_CODESEPARATOR removed.
    ///
    /// Unparseable tails are copied verbatim.
    pub fn without_codeseparators(&self) -> Script {
        let mut out = Vec::with_capacity(self.0.len());
        let mut pos = 0;
        while pos < self.0.len() {
            let start = pos;
            match read_chunk(&self.0, &mut pos) {
                Ok(chunk) if chunk.op == OP_CODESEPARATOR => {}
                Ok(_) => out.extend_from_slice(&self.0[start..pos]),
                Err(_) => {
                    out.extend_from_slice(&self.0[start..]);
                    break;
                }
            }
        }
        Script(out)
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append a minimal data push.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        self.0.extend(push_data_prefix(data.len())?);
        self.0.extend_from_slice(data);
        Ok(self)
    }

    /// Append a non-push opcode.
    pub fn append_opcode(&mut self, op: u8) -> &mut Self {
        self.0.push(op);
        self
    }

    /// Append an integer: `-1`..=`16` as a single opcode, otherwise as a
    /// script-number push.
    pub fn append_int(&mut self, n: i64) -> Result<&mut Self, ScriptError> {
        if n == -1 {
            return Ok(self.append_opcode(OP_1NEGATE));
        }
        if let Some(op) = u8::try_from(n).ok().and_then(encode_small_int) {
            return Ok(self.append_opcode(op));
        }
        self.append_push_data(&script_num_encode(n))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_decimal(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Little-endian sign-magnitude encoding of a script number.
pub fn script_num_encode(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut out = Vec::new();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode a script number of at most 8 bytes; longer input decodes its low 8 bytes.
pub fn script_num_decode(data: &[u8]) -> i64 {
    let data = &data[..data.len().min(8)];
    let Some((&last, _)) = data.split_last() else {
        return 0;
    };
    let mut value: i64 = 0;
    for (i, b) in data.iter().enumerate() {
        let b = if i == data.len() - 1 { b & 0x7f } else { *b };
        value |= (b as i64) << (8 * i);
    }
    if last & 0x80 != 0 {
        -value
    } else {
        value
    }
}

/// Name of a defined sighash byte.
pub fn sighash_name(hash_type: u8) -> Option<&'static str> {
    match hash_type {
        0x01 => Some("ALL"),
        0x81 => Some("ALL|ANYONECANPAY"),
        0x02 => Some("NONE"),
        0x82 => Some("NONE|ANYONECANPAY"),
        0x03 => Some("SINGLE"),
        0x83 => Some("SINGLE|ANYONECANPAY"),
        _ => None,
    }
}

/// Strict DER signature followed by one defined sighash byte.
pub fn is_strict_signature(sig: &[u8]) -> bool {
    is_valid_signature_encoding(sig)
        && sig.last().map(|t| sighash_name(*t).is_some()).unwrap_or(false)
}

/// DER layout check for `0x30 len 0x02 rlen R 0x02 slen S hashtype`.
///
/// Integers must be positive and minimally encoded, and the lengths must
/// account for every byte.
pub fn is_valid_signature_encoding(sig: &[u8]) -> bool {
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }
    if sig[0] != 0x30 || sig[1] as usize != sig.len() - 3 {
        return false;
    }
    let len_r = sig[3] as usize;
    if 5 + len_r >= sig.len() {
        return false;
    }
    let len_s = sig[5 + len_r] as usize;
    if len_r + len_s + 7 != sig.len() {
        return false;
    }
    if sig[2] != 0x02 || len_r == 0 || sig[4] & 0x80 != 0 {
        return false;
    }
    if len_r > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return false;
    }
    if sig[len_r + 4] != 0x02 || len_s == 0 || sig[len_r + 6] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && sig[len_r + 6] == 0x00 && sig[len_r + 7] & 0x80 == 0 {
        return false;
    }
    true
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
