//! Post-signing verification of an input against the output it spends.
//!
//! `StandardScriptVerifier` evaluates the standard templates directly
//! instead of running a general interpreter. It enforces the policy rules
//! a relaying node applies to those templates: push-only unlocking
//! scripts, strict DER with low S, defined sighash bytes, the null dummy,
//! null failures, clean stacks and the witness v0 program rules.

use rawtx_primitives::ec::Signature;
use rawtx_primitives::hash::{hash160, sha256};
use rawtx_script::chunk::push_data_prefix;
use rawtx_script::script::{is_valid_signature_encoding, sighash_name};
use rawtx_script::standard::script_for_destination;
use rawtx_script::{solve, Destination, Script, ScriptTemplate};
use rawtx_transaction::SigVersion;
use thiserror::Error;

use crate::checker::SignatureChecker;

/// Why an input failed verification. Messages are the ones reported per
/// input in a signing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptFailure {
    #[error("Script evaluated without error but finished with a false/empty top stack element")]
    EvalFalse,
    #[error("OP_RETURN was encountered")]
    OpReturn,
    #[error("Operation not valid with the current stack size")]
    InvalidStackOperation,
    #[error("Script failed an OP_EQUALVERIFY operation")]
    EqualVerify,
    #[error("Only non-push operators allowed in signatures")]
    SigPushOnly,
    #[error("Non-canonical DER signature")]
    SigDer,
    #[error("Non-canonical signature: S value is unnecessarily high")]
    SigHighS,
    #[error("Signature hash type missing or not understood")]
    SigHashType,
    #[error("Public key is neither compressed or uncompressed")]
    PubKeyType,
    #[error("Using non-compressed keys in segwit")]
    WitnessPubKeyType,
    #[error("Dummy CHECKMULTISIG argument must be zero")]
    SigNullDummy,
    #[error("Signature must be zero for failed CHECK(MULTI)SIG operation")]
    NullFail,
    #[error("Extra items left on stack after execution")]
    CleanStack,
    #[error("Witness program has incorrect length")]
    WitnessProgramWrongLength,
    #[error("Witness program was passed an empty witness")]
    WitnessProgramWitnessEmpty,
    #[error("Witness program hash mismatch")]
    WitnessProgramMismatch,
    #[error("Witness requires empty scriptSig")]
    WitnessMalleated,
    #[error("Witness requires only-redeemscript scriptSig")]
    WitnessMalleatedP2sh,
    #[error("Witness provided for non-witness script")]
    WitnessUnexpected,
    #[error("Witness version reserved for soft-fork upgrades")]
    DiscourageUpgradableWitnessProgram,
    #[error("unknown error")]
    UnknownError,
}

/// Checks that an unlocking script and witness satisfy a locking script.
///
/// The amount and the transaction context are carried by `checker`.
pub trait ScriptVerifier {
    fn verify_script(
        &self,
        script_sig: &Script,
        script_pub_key: &Script,
        witness: &[Vec<u8>],
        checker: &dyn SignatureChecker,
    ) -> Result<(), ScriptFailure>;
}

/// Template-level verifier for the standard output types.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScriptVerifier;

impl ScriptVerifier for StandardScriptVerifier {
    fn verify_script(
        &self,
        script_sig: &Script,
        script_pub_key: &Script,
        witness: &[Vec<u8>],
        checker: &dyn SignatureChecker,
    ) -> Result<(), ScriptFailure> {
        let Some(mut stack) = script_sig.push_stack() else {
            return Err(ScriptFailure::SigPushOnly);
        };

        if let Some((version, program)) = script_pub_key.witness_program() {
            if !script_sig.is_empty() {
                return Err(ScriptFailure::WitnessMalleated);
            }
            return verify_witness_program(witness, version, program, checker);
        }

        if let ScriptTemplate::ScriptHash(script_id) = solve(script_pub_key) {
            let redeem = stack.pop().ok_or(ScriptFailure::InvalidStackOperation)?;
            if hash160(&redeem) != script_id {
                return Err(ScriptFailure::EvalFalse);
            }
            let redeem_script = Script::from_bytes(&redeem);
            if let Some((version, program)) = redeem_script.witness_program() {
                if !is_single_push_of(script_sig, &redeem) {
                    return Err(ScriptFailure::WitnessMalleatedP2sh);
                }
                return verify_witness_program(witness, version, program, checker);
            }
            eval_template(&redeem_script, &mut stack, checker, SigVersion::Base)?;
        } else {
            eval_template(script_pub_key, &mut stack, checker, SigVersion::Base)?;
        }

        if !stack.is_empty() {
            return Err(ScriptFailure::CleanStack);
        }
        if !witness.is_empty() {
            return Err(ScriptFailure::WitnessUnexpected);
        }
        Ok(())
    }
}

fn is_single_push_of(script_sig: &Script, data: &[u8]) -> bool {
    let Ok(mut expected) = push_data_prefix(data.len()) else {
        return false;
    };
    expected.extend_from_slice(data);
    script_sig.as_bytes() == expected.as_slice()
}

fn verify_witness_program(
    witness: &[Vec<u8>],
    version: u8,
    program: &[u8],
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptFailure> {
    if version != 0 {
        return Err(ScriptFailure::DiscourageUpgradableWitnessProgram);
    }
    let (script, mut stack) = match program.len() {
        32 => {
            let Some((script_bytes, rest)) = witness.split_last() else {
                return Err(ScriptFailure::WitnessProgramWitnessEmpty);
            };
            if sha256(script_bytes).as_slice() != program {
                return Err(ScriptFailure::WitnessProgramMismatch);
            }
            (Script::from_bytes(script_bytes), rest.to_vec())
        }
        20 => {
            if witness.len() != 2 {
                return Err(ScriptFailure::WitnessProgramMismatch);
            }
            let mut key_id = [0u8; 20];
            key_id.copy_from_slice(program);
            (script_for_destination(&Destination::KeyHash(key_id)), witness.to_vec())
        }
        _ => return Err(ScriptFailure::WitnessProgramWrongLength),
    };
    eval_template(&script, &mut stack, checker, SigVersion::WitnessV0)?;
    if !stack.is_empty() {
        return Err(ScriptFailure::EvalFalse);
    }
    Ok(())
}

fn pop(stack: &mut Vec<Vec<u8>>) -> Result<Vec<u8>, ScriptFailure> {
    stack.pop().ok_or(ScriptFailure::InvalidStackOperation)
}

/// Consume the elements `script` needs from the top of `stack`, succeeding
/// only when the script would leave a true value behind.
fn eval_template(
    script: &Script,
    stack: &mut Vec<Vec<u8>>,
    checker: &dyn SignatureChecker,
    sig_version: SigVersion,
) -> Result<(), ScriptFailure> {
    match solve(script) {
        ScriptTemplate::PubKey(key) => {
            let sig = pop(stack)?;
            check_sig_op(&sig, &key, script, checker, sig_version)
        }
        ScriptTemplate::PubKeyHash(key_id) => {
            let pubkey = pop(stack)?;
            if hash160(&pubkey) != key_id {
                return Err(ScriptFailure::EqualVerify);
            }
            let sig = pop(stack)?;
            check_sig_op(&sig, &pubkey, script, checker, sig_version)
        }
        ScriptTemplate::ScriptHash(script_id) => {
            let top = pop(stack)?;
            if hash160(&top) != script_id {
                return Err(ScriptFailure::EvalFalse);
            }
            Ok(())
        }
        ScriptTemplate::MultiSig { required, keys } => {
            check_multisig_op(required, &keys, stack, script, checker, sig_version)
        }
        ScriptTemplate::WitnessV0KeyHash(_) | ScriptTemplate::WitnessV0ScriptHash(_) => {
            Err(ScriptFailure::CleanStack)
        }
        ScriptTemplate::NullData => Err(ScriptFailure::OpReturn),
        ScriptTemplate::NonStandard => Err(ScriptFailure::UnknownError),
    }
}

fn check_signature_encoding(sig: &[u8]) -> Result<(), ScriptFailure> {
    if sig.is_empty() {
        return Ok(());
    }
    if !is_valid_signature_encoding(sig) {
        return Err(ScriptFailure::SigDer);
    }
    let Some((&hash_type, der)) = sig.split_last() else {
        return Err(ScriptFailure::SigDer);
    };
    match Signature::from_der(der) {
        Ok(parsed) if !parsed.is_low_s() => return Err(ScriptFailure::SigHighS),
        Ok(_) => {}
        Err(_) => return Err(ScriptFailure::SigDer),
    }
    if sighash_name(hash_type).is_none() {
        return Err(ScriptFailure::SigHashType);
    }
    Ok(())
}

fn check_pubkey_encoding(pubkey: &[u8], sig_version: SigVersion) -> Result<(), ScriptFailure> {
    let compressed = pubkey.len() == 33 && matches!(pubkey[0], 0x02 | 0x03);
    let uncompressed = pubkey.len() == 65 && pubkey[0] == 0x04;
    if !compressed && !uncompressed {
        return Err(ScriptFailure::PubKeyType);
    }
    if sig_version == SigVersion::WitnessV0 && !compressed {
        return Err(ScriptFailure::WitnessPubKeyType);
    }
    Ok(())
}

fn check_sig_op(
    sig: &[u8],
    pubkey: &[u8],
    script_code: &Script,
    checker: &dyn SignatureChecker,
    sig_version: SigVersion,
) -> Result<(), ScriptFailure> {
    check_signature_encoding(sig)?;
    check_pubkey_encoding(pubkey, sig_version)?;
    if checker.check_sig(sig, pubkey, script_code, sig_version) {
        Ok(())
    } else if sig.is_empty() {
        Err(ScriptFailure::EvalFalse)
    } else {
        Err(ScriptFailure::NullFail)
    }
}

/// Signatures are matched against keys in order, each key tried once;
/// the check fails as soon as too few keys remain for the unmatched
/// signatures.
fn check_multisig_op(
    required: usize,
    keys: &[Vec<u8>],
    stack: &mut Vec<Vec<u8>>,
    script_code: &Script,
    checker: &dyn SignatureChecker,
    sig_version: SigVersion,
) -> Result<(), ScriptFailure> {
    if stack.len() < required + 1 {
        return Err(ScriptFailure::InvalidStackOperation);
    }
    let sigs = stack.split_off(stack.len() - required);
    let dummy = pop(stack)?;

    let mut isig = 0;
    let mut ikey = 0;
    let mut success = true;
    while success && isig < sigs.len() {
        let sig = &sigs[isig];
        let key = &keys[ikey];
        check_signature_encoding(sig)?;
        check_pubkey_encoding(key, sig_version)?;
        if checker.check_sig(sig, key, script_code, sig_version) {
            isig += 1;
        }
        ikey += 1;
        if sigs.len() - isig > keys.len() - ikey {
            success = false;
        }
    }

    if !success && sigs.iter().any(|s| !s.is_empty()) {
        return Err(ScriptFailure::NullFail);
    }
    if !dummy.is_empty() {
        return Err(ScriptFailure::SigNullDummy);
    }
    if !success {
        return Err(ScriptFailure::EvalFalse);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawtx_script::opcodes::*;
    use rawtx_script::standard::{multisig_script, pubkey_script};

    // Structurally valid low-S DER signature with an ALL sighash byte.
    fn der_sig(tag: u8) -> Vec<u8> {
        let mut sig = vec![0x30, 0x06, 0x02, 0x01, tag, 0x02, 0x01, 0x01];
        sig.push(0x01);
        sig
    }

    fn key(tag: u8) -> Vec<u8> {
        let mut k = vec![0x02; 33];
        k[32] = tag;
        k
    }

    /// Accepts a signature for a key when the signature's R byte equals
    /// the key's last byte.
    struct TagChecker;

    impl SignatureChecker for TagChecker {
        fn check_sig(&self, sig: &[u8], pubkey: &[u8], _: &Script, _: SigVersion) -> bool {
            sig.len() > 4 && Some(&sig[4]) == pubkey.last()
        }
    }

    fn verify(script_sig: &Script, script_pub_key: &Script, witness: &[Vec<u8>]) -> Result<(), ScriptFailure> {
        StandardScriptVerifier.verify_script(script_sig, script_pub_key, witness, &TagChecker)
    }

    #[test]
    fn test_pay_to_pubkey() {
        let spk = pubkey_script(&key(5));
        let good = Script::from_push_stack(&[der_sig(5)]).expect("push");
        let wrong = Script::from_push_stack(&[der_sig(6)]).expect("push");
        assert_eq!(verify(&good, &spk, &[]), Ok(()));
        assert_eq!(verify(&wrong, &spk, &[]), Err(ScriptFailure::NullFail));
        assert_eq!(verify(&Script::new(), &spk, &[]), Err(ScriptFailure::InvalidStackOperation));
        assert_eq!(
            verify(&Script::from_bytes(&[OP_0]), &spk, &[]),
            Err(ScriptFailure::EvalFalse)
        );
    }

    #[test]
    fn test_rejects_non_push_and_leftovers() {
        let spk = pubkey_script(&key(5));
        let non_push = Script::from_bytes(&[OP_DUP]);
        assert_eq!(verify(&non_push, &spk, &[]), Err(ScriptFailure::SigPushOnly));
        let extra = Script::from_push_stack(&[vec![7], der_sig(5)]).expect("push");
        assert_eq!(verify(&extra, &spk, &[]), Err(ScriptFailure::CleanStack));
        let good = Script::from_push_stack(&[der_sig(5)]).expect("push");
        assert_eq!(verify(&good, &spk, &[vec![1]]), Err(ScriptFailure::WitnessUnexpected));
    }

    #[test]
    fn test_key_hash_mismatch() {
        let spk = script_for_destination(&Destination::KeyHash(hash160(&key(5))));
        let wrong_key = Script::from_push_stack(&[der_sig(5), key(6)]).expect("push");
        assert_eq!(verify(&wrong_key, &spk, &[]), Err(ScriptFailure::EqualVerify));
        let good = Script::from_push_stack(&[der_sig(5), key(5)]).expect("push");
        assert_eq!(verify(&good, &spk, &[]), Ok(()));
    }

    #[test]
    fn test_signature_encoding_rules() {
        let spk = pubkey_script(&key(5));
        let mut undefined_type = der_sig(5);
        *undefined_type.last_mut().expect("byte") = 0x04;
        let s = Script::from_push_stack(&[undefined_type]).expect("push");
        assert_eq!(verify(&s, &spk, &[]), Err(ScriptFailure::SigHashType));

        let s = Script::from_push_stack(&[vec![0x30, 0x01, 0x01]]).expect("push");
        assert_eq!(verify(&s, &spk, &[]), Err(ScriptFailure::SigDer));

        let mut hybrid = vec![0x06; 65];
        hybrid[64] = 5;
        let s = Script::from_push_stack(&[der_sig(5)]).expect("push");
        assert_eq!(verify(&s, &pubkey_script(&hybrid), &[]), Err(ScriptFailure::PubKeyType));
        assert_eq!(verify(&s, &pubkey_script(&[0x05; 33]), &[]), Err(ScriptFailure::UnknownError));
    }

    #[test]
    fn test_multisig_order_and_dummy() {
        let spk = multisig_script(2, &[key(1), key(2), key(3)]).expect("script");
        let ok = Script::from_push_stack(&[vec![], der_sig(1), der_sig(3)]).expect("push");
        assert_eq!(verify(&ok, &spk, &[]), Ok(()));

        let reversed = Script::from_push_stack(&[vec![], der_sig(3), der_sig(1)]).expect("push");
        assert_eq!(verify(&reversed, &spk, &[]), Err(ScriptFailure::NullFail));

        let partial = Script::from_push_stack(&[vec![], der_sig(1), vec![]]).expect("push");
        assert_eq!(verify(&partial, &spk, &[]), Err(ScriptFailure::NullFail));

        let unsigned = Script::from_push_stack(&[vec![], vec![], vec![]]).expect("push");
        assert_eq!(verify(&unsigned, &spk, &[]), Err(ScriptFailure::EvalFalse));

        let dummy = Script::from_push_stack(&[vec![9], der_sig(1), der_sig(3)]).expect("push");
        assert_eq!(verify(&dummy, &spk, &[]), Err(ScriptFailure::SigNullDummy));
    }

    #[test]
    fn test_script_hash() {
        let redeem = multisig_script(1, &[key(1), key(2)]).expect("script");
        let spk = script_for_destination(&Destination::ScriptHash(hash160(redeem.as_bytes())));
        let ok = Script::from_push_stack(&[vec![], der_sig(2), redeem.as_bytes().to_vec()]).expect("push");
        assert_eq!(verify(&ok, &spk, &[]), Ok(()));

        let other = multisig_script(1, &[key(1)]).expect("script");
        let wrong = Script::from_push_stack(&[vec![], der_sig(1), other.into_bytes()]).expect("push");
        assert_eq!(verify(&wrong, &spk, &[]), Err(ScriptFailure::EvalFalse));
    }

    #[test]
    fn test_witness_key_hash() {
        let spk = script_for_destination(&Destination::WitnessKeyHash(hash160(&key(5))));
        assert_eq!(verify(&Script::new(), &spk, &[der_sig(5), key(5)]), Ok(()));
        assert_eq!(
            verify(&Script::new(), &spk, &[der_sig(5)]),
            Err(ScriptFailure::WitnessProgramMismatch)
        );
        let non_empty = Script::from_bytes(&[OP_1]);
        assert_eq!(
            verify(&non_empty, &spk, &[der_sig(5), key(5)]),
            Err(ScriptFailure::WitnessMalleated)
        );
    }

    #[test]
    fn test_witness_script_hash() {
        let inner = pubkey_script(&key(5));
        let spk = script_for_destination(&Destination::WitnessScriptHash(sha256(inner.as_bytes())));
        let w = inner.as_bytes().to_vec();
        assert_eq!(verify(&Script::new(), &spk, &[der_sig(5), w.clone()]), Ok(()));
        assert_eq!(
            verify(&Script::new(), &spk, &[]),
            Err(ScriptFailure::WitnessProgramWitnessEmpty)
        );
        assert_eq!(
            verify(&Script::new(), &spk, &[der_sig(5), vec![OP_1]]),
            Err(ScriptFailure::WitnessProgramMismatch)
        );
    }

    #[test]
    fn test_p2sh_wrapped_witness_requires_bare_redeem_push() {
        let program = script_for_destination(&Destination::WitnessKeyHash(hash160(&key(5))));
        let spk = script_for_destination(&Destination::ScriptHash(hash160(program.as_bytes())));
        let script_sig = Script::from_push_stack(&[program.as_bytes().to_vec()]).expect("push");
        assert_eq!(verify(&script_sig, &spk, &[der_sig(5), key(5)]), Ok(()));

        let padded = Script::from_push_stack(&[vec![], program.into_bytes()]).expect("push");
        assert_eq!(
            verify(&padded, &spk, &[der_sig(5), key(5)]),
            Err(ScriptFailure::WitnessMalleatedP2sh)
        );
    }
}
