//! Signature hash computation for transaction signing.
//!
//! Two digest algorithms are supported: the legacy algorithm used for
//! base scripts (including P2SH redeem scripts), which serializes a
//! modified copy of the transaction, and the BIP-143 algorithm used for
//! witness v0 programs, which commits to the spent value.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

use rawtx_primitives::hash::sha256d;
use rawtx_primitives::util::WireWriter;
use rawtx_script::Script;

use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// Digest returned by the legacy algorithm when the input index is out of
/// range, or when SINGLE has no matching output.
pub const SIGHASH_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Which digest algorithm a script is evaluated under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigVersion {
    Base,
    WitnessV0,
}

/// Parse a sighash mode string.
///
/// Accepts `ALL`, `NONE` and `SINGLE`, each optionally suffixed with
/// `|ANYONECANPAY`.
pub fn parse_sighash(mode: &str) -> Result<u32, TransactionError> {
    let hash_type = match mode {
        "ALL" => SIGHASH_ALL,
        "ALL|ANYONECANPAY" => SIGHASH_ALL | SIGHASH_ANYONECANPAY,
        "NONE" => SIGHASH_NONE,
        "NONE|ANYONECANPAY" => SIGHASH_NONE | SIGHASH_ANYONECANPAY,
        "SINGLE" => SIGHASH_SINGLE,
        "SINGLE|ANYONECANPAY" => SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
        _ => return Err(TransactionError::InvalidSighash),
    };
    Ok(hash_type)
}

/// Compute the digest an input's signature commits to.
///
/// # Arguments
/// * `tx`          - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `script_code` - The script being satisfied (locking, redeem or witness script).
/// * `amount`      - Value of the spent output; used only by `WitnessV0`.
/// * `hash_type`   - The full sighash byte, as appended to signatures.
/// * `sig_version` - Which algorithm to use.
///
/// # Returns
/// The 32-byte double-SHA256 digest. The legacy algorithm never fails and
/// yields `SIGHASH_ONE` for its two degenerate cases; the witness algorithm
/// rejects an out-of-range input index.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    amount: u64,
    hash_type: u32,
    sig_version: SigVersion,
) -> Result<[u8; 32], TransactionError> {
    match sig_version {
        SigVersion::Base => Ok(legacy_signature_hash(tx, input_index, script_code, hash_type)),
        SigVersion::WitnessV0 => {
            if input_index >= tx.inputs.len() {
                return Err(TransactionError::InvalidTransaction(format!(
                    "input index {} out of range (tx has {} inputs)",
                    input_index,
                    tx.inputs.len()
                )));
            }
            Ok(sha256d(&witness_v0_preimage(
                tx,
                input_index,
                script_code,
                amount,
                hash_type,
            )))
        }
    }
}

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Legacy digest: serialize a copy of the transaction in which only the
/// signed input carries a script (the code-separator-free script code),
/// trimmed according to the hash type, then append the hash type.
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    hash_type: u32,
) -> [u8; 32] {
    if input_index >= tx.inputs.len() {
        return SIGHASH_ONE;
    }
    let base_type = hash_type & SIGHASH_MASK;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return SIGHASH_ONE;
    }

    let script_code = script_code.without_codeseparators();
    let empty = Script::new();
    let mut writer = WireWriter::with_capacity(256);
    writer.write_i32_le(tx.version);

    let signed_inputs: Vec<usize> = if anyone_can_pay {
        vec![input_index]
    } else {
        (0..tx.inputs.len()).collect()
    };
    writer.write_varint(signed_inputs.len().into());
    for i in signed_inputs {
        let input = &tx.inputs[i];
        input.previous_output.write_to(&mut writer);
        let script = if i == input_index { &script_code } else { &empty };
        writer.write_var_bytes(script.as_bytes());
        let zero_sequence =
            i != input_index && (base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE);
        writer.write_u32_le(if zero_sequence { 0 } else { input.sequence_number });
    }

    match base_type {
        SIGHASH_NONE => writer.write_varint(0usize.into()),
        SIGHASH_SINGLE => {
            writer.write_varint((input_index + 1).into());
            let null = TransactionOutput::null();
            for _ in 0..input_index {
                null.write_to(&mut writer);
            }
            tx.outputs[input_index].write_to(&mut writer);
        }
        _ => {
            writer.write_varint(tx.outputs.len().into());
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(hash_type);
    sha256d(writer.as_bytes())
}

// -----------------------------------------------------------------------
// BIP-143 signature hash
// -----------------------------------------------------------------------

/// Compute the BIP-143 pre-image before double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE) - value of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - sha256d of all outputs or one output
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
///
/// The caller guarantees `input_index` is in range.
fn witness_v0_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    amount: u64,
    hash_type: u32,
) -> Vec<u8> {
    let input = &tx.inputs[input_index];
    let base_type = hash_type & SIGHASH_MASK;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
    let commits_all_outputs = base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE;

    let hash_prevouts = if !anyone_can_pay {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_sequence = if !anyone_can_pay && commits_all_outputs {
        sequence_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_outputs = if commits_all_outputs {
        outputs_hash(&tx.outputs)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        outputs_hash(&tx.outputs[input_index..=input_index])
    } else {
        [0u8; 32]
    };

    let mut writer = WireWriter::with_capacity(160 + script_code.len());
    writer.write_i32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.previous_output.write_to(&mut writer);
    writer.write_var_bytes(script_code.as_bytes());
    writer.write_u64_le(amount);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(hash_type);
    writer.into_bytes()
}

fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.previous_output.write_to(&mut writer);
    }
    sha256d(writer.as_bytes())
}

fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

fn outputs_hash(outputs: &[TransactionOutput]) -> [u8; 32] {
    let mut writer = WireWriter::new();
    for output in outputs {
        output.write_to(&mut writer);
    }
    sha256d(writer.as_bytes())
}
