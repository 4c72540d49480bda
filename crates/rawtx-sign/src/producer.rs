//! Fresh signature production for the standard templates.
//!
//! Covers pay-to-pubkey, pay-to-pubkey-hash and bare multisig, the same
//! three wrapped in P2SH, witness v0 key-hash (bare or P2SH-wrapped) and
//! witness v0 script-hash (bare or P2SH-wrapped).

use rawtx_primitives::hash::{hash160, ripemd160};
use rawtx_script::standard::script_for_destination;
use rawtx_script::{solve, Destination, Script, ScriptTemplate};
use rawtx_transaction::sighash::signature_hash;
use rawtx_transaction::{SigVersion, Transaction};

use crate::keystore::SigningProvider;
use crate::sigdata::SignatureData;
use crate::SignError;

/// Creates signatures for one input of a transaction.
pub struct SignatureCreator<'a> {
    provider: &'a dyn SigningProvider,
    tx: &'a Transaction,
    input_index: usize,
    amount: u64,
    hash_type: u32,
}

impl<'a> SignatureCreator<'a> {
    pub fn new(
        provider: &'a dyn SigningProvider,
        tx: &'a Transaction,
        input_index: usize,
        amount: u64,
        hash_type: u32,
    ) -> Self {
        SignatureCreator {
            provider,
            tx,
            input_index,
            amount,
            hash_type,
        }
    }

    /// DER signature plus sighash byte by the key with id `key_id`, or
    /// `None` when the key is unknown. Uncompressed keys never sign for
    /// witness scripts.
    pub fn create_sig(&self, key_id: &[u8; 20], script_code: &Script, sig_version: SigVersion) -> Option<Vec<u8>> {
        let key = self.provider.get_key(key_id)?;
        if sig_version == SigVersion::WitnessV0 && !key.is_compressed() {
            return None;
        }
        let digest = signature_hash(
            self.tx,
            self.input_index,
            script_code,
            self.amount,
            self.hash_type,
            sig_version,
        )
        .ok()?;
        let signature = match key.sign(&digest) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::debug!(input = self.input_index, error = %e, "signing failed");
                return None;
            }
        };
        let mut bytes = signature.to_der();
        bytes.push(self.hash_type as u8);
        Some(bytes)
    }
}

/// One solving step: the stack elements that satisfy `script`, and the
/// template it matched. `complete` is false when some needed key or
/// script is missing; the returned elements are still useful as partial
/// material.
struct Step {
    template: ScriptTemplate,
    stack: Vec<Vec<u8>>,
    complete: bool,
}

fn sign_step(creator: &SignatureCreator, script: &Script, sig_version: SigVersion) -> Step {
    let template = solve(script);
    let mut stack = Vec::new();
    let complete = match &template {
        ScriptTemplate::NonStandard | ScriptTemplate::NullData => false,
        ScriptTemplate::PubKey(key) => match creator.create_sig(&hash160(key), script, sig_version) {
            Some(sig) => {
                stack.push(sig);
                true
            }
            None => false,
        },
        ScriptTemplate::PubKeyHash(key_id) => {
            match (
                creator.create_sig(key_id, script, sig_version),
                creator.provider.get_pubkey(key_id),
            ) {
                (Some(sig), Some(pubkey)) => {
                    stack.push(sig);
                    stack.push(pubkey.to_bytes());
                    true
                }
                _ => false,
            }
        }
        ScriptTemplate::ScriptHash(script_id) => match creator.provider.get_script(script_id) {
            Some(redeem) => {
                stack.push(redeem.into_bytes());
                true
            }
            None => false,
        },
        ScriptTemplate::MultiSig { required, keys } => {
            stack.push(Vec::new());
            let mut signed = 0;
            for key in keys {
                if signed >= *required {
                    break;
                }
                if let Some(sig) = creator.create_sig(&hash160(key), script, sig_version) {
                    stack.push(sig);
                    signed += 1;
                }
            }
            signed == *required
        }
        ScriptTemplate::WitnessV0KeyHash(key_id) => {
            stack.push(key_id.to_vec());
            true
        }
        ScriptTemplate::WitnessV0ScriptHash(program) => {
            let script_id = ripemd160(program);
            match creator.provider.get_script(&script_id) {
                Some(witness_script) => {
                    stack.push(witness_script.into_bytes());
                    true
                }
                None => false,
            }
        }
    };
    Step {
        template,
        stack,
        complete,
    }
}

/// Produce signing material for an input spending `script_pub_key`.
///
/// # Returns
/// `(complete, data)`: `complete` is true when every needed signature was
/// created. Incomplete material, such as a multisig with fewer than the
/// required signatures, is still returned so it can be merged.
pub fn produce_signature(
    creator: &SignatureCreator,
    script_pub_key: &Script,
) -> Result<(bool, SignatureData), SignError> {
    let step = sign_step(creator, script_pub_key, SigVersion::Base);
    let mut complete = step.complete;
    let mut template = step.template;
    let mut result = step.stack;
    let mut witness = Vec::new();
    let mut redeem_script = None;

    if complete {
        if let ScriptTemplate::ScriptHash(_) = template {
            let subscript = Script::from_bytes(&result[0]);
            let inner = sign_step(creator, &subscript, SigVersion::Base);
            complete = inner.complete && !matches!(inner.template, ScriptTemplate::ScriptHash(_));
            template = inner.template;
            result = inner.stack;
            redeem_script = Some(subscript);
        }
    }

    if complete {
        match template {
            ScriptTemplate::WitnessV0KeyHash(key_id) => {
                let witness_script = script_for_destination(&Destination::KeyHash(key_id));
                let inner = sign_step(creator, &witness_script, SigVersion::WitnessV0);
                complete = inner.complete;
                witness = inner.stack;
                result.clear();
            }
            ScriptTemplate::WitnessV0ScriptHash(_) => {
                let witness_script = Script::from_bytes(&result[0]);
                let inner = sign_step(creator, &witness_script, SigVersion::WitnessV0);
                complete = inner.complete
                    && !matches!(
                        inner.template,
                        ScriptTemplate::ScriptHash(_)
                            | ScriptTemplate::WitnessV0KeyHash(_)
                            | ScriptTemplate::WitnessV0ScriptHash(_)
                    );
                witness = inner.stack;
                witness.push(witness_script.into_bytes());
                result.clear();
            }
            _ => {}
        }
    }

    if let Some(redeem) = redeem_script {
        result.push(redeem.into_bytes());
    }

    let data = SignatureData {
        script_sig: Script::from_push_stack(&result)?,
        witness,
    };
    tracing::debug!(input = creator.input_index, complete, "produced signature material");
    Ok((complete, data))
}
