//! Merging signing material from independently signed copies of one input.
//!
//! Dispatches on the template of the spent locking script:
//!
//! | template                 | rule                                            |
//! |--------------------------|-------------------------------------------------|
//! | pubkey, pubkey-hash      | keep the fuller side                            |
//! | witness key-hash         | same, counting the witness stack                |
//! | multisig                 | union of valid signatures, ordered by key, capped at m |
//! | script-hash              | recurse into the redeem script both sides carry on top |
//! | witness script-hash      | recurse into the shared witness script on top of the witness |
//! | anything else            | keep the fuller side                            |
//!
//! The fuller side has more non-empty elements, then more bytes; equal
//! counts fall back to comparing the bytes, so the choice never depends on
//! argument order. Every rule is commutative and idempotent, and merging a
//! result again with either input leaves it unchanged.

use std::collections::{BTreeSet, HashMap};

use rawtx_script::{solve, Script, ScriptTemplate};
use rawtx_transaction::SigVersion;

use crate::checker::SignatureChecker;
use crate::sigdata::{SignatureData, Stacks};
use crate::SignError;

/// Merge two sets of signing material for an input spending `script_pub_key`.
pub fn combine_signatures(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    a: &SignatureData,
    b: &SignatureData,
) -> Result<SignatureData, SignError> {
    let merged = combine_stacks(
        script_pub_key,
        checker,
        Stacks::from_data(a),
        Stacks::from_data(b),
        SigVersion::Base,
    );
    Ok(merged.into_data()?)
}

/// Ordering used to pick between two non-mergeable stacks: more non-empty
/// elements first, then more bytes, then the bytes themselves. Only equal
/// stacks tie.
fn fullness(s: &Stacks) -> (usize, usize, &[Vec<u8>], &[Vec<u8>]) {
    let elements = s.script.iter().chain(&s.witness);
    let filled = elements.clone().filter(|e| !e.is_empty()).count();
    let bytes = elements.map(Vec::len).sum();
    (filled, bytes, s.script.as_slice(), s.witness.as_slice())
}

fn fuller(a: Stacks, b: Stacks) -> Stacks {
    let b_wins = fullness(&b) > fullness(&a);
    if b_wins {
        b
    } else {
        a
    }
}

/// Split off the script on top of each stack when both carry the same one.
fn common_top(a: &mut Vec<Vec<u8>>, b: &mut Vec<Vec<u8>>) -> Option<Vec<u8>> {
    match (a.last(), b.last()) {
        (Some(x), Some(y)) if !x.is_empty() && x == y => {
            b.pop();
            a.pop()
        }
        _ => None,
    }
}

fn combine_stacks(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    mut a: Stacks,
    mut b: Stacks,
    sig_version: SigVersion,
) -> Stacks {
    match solve(script_pub_key) {
        ScriptTemplate::PubKey(_) | ScriptTemplate::PubKeyHash(_) | ScriptTemplate::WitnessV0KeyHash(_) => {
            fuller(a, b)
        }
        ScriptTemplate::ScriptHash(_) => {
            let Some(redeem) = common_top(&mut a.script, &mut b.script) else {
                return fuller(a, b);
            };
            let redeem_script = Script::from_bytes(&redeem);
            let mut merged = combine_stacks(&redeem_script, checker, a, b, sig_version);
            merged.script.push(redeem);
            merged
        }
        ScriptTemplate::WitnessV0ScriptHash(_) => {
            let Some(witness_script) = common_top(&mut a.witness, &mut b.witness) else {
                return fuller(a, b);
            };
            let inner = Script::from_bytes(&witness_script);
            let merged = combine_stacks(
                &inner,
                checker,
                Stacks::from_script(a.witness),
                Stacks::from_script(b.witness),
                SigVersion::WitnessV0,
            );
            let mut witness = merged.script;
            witness.push(witness_script);
            Stacks {
                script: Vec::new(),
                witness,
            }
        }
        ScriptTemplate::MultiSig { required, keys } => Stacks::from_script(combine_multisig(
            script_pub_key,
            checker,
            required,
            &keys,
            &a.script,
            &b.script,
            sig_version,
        )),
        ScriptTemplate::NonStandard | ScriptTemplate::NullData => fuller(a, b),
    }
}

/// Match every distinct non-empty signature from either side to the first
/// key it verifies against, then lay them out in key order behind the
/// dummy element, padding unfilled slots with empty pushes.
fn combine_multisig(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    required: usize,
    keys: &[Vec<u8>],
    a: &[Vec<u8>],
    b: &[Vec<u8>],
    sig_version: SigVersion,
) -> Vec<Vec<u8>> {
    let all_sigs: BTreeSet<&Vec<u8>> = a.iter().chain(b).filter(|s| !s.is_empty()).collect();

    let mut by_key: HashMap<usize, &Vec<u8>> = HashMap::new();
    for sig in all_sigs {
        let matched = (0..keys.len()).find(|&i| {
            !by_key.contains_key(&i) && checker.check_sig(sig, &keys[i], script_pub_key, sig_version)
        });
        if let Some(i) = matched {
            by_key.insert(i, sig);
        }
    }

    let mut result = vec![Vec::new()];
    for i in 0..keys.len() {
        if result.len() > required {
            break;
        }
        if let Some(sig) = by_key.get(&i) {
            result.push((*sig).clone());
        }
    }
    result.resize(required + 1, Vec::new());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawtx_script::opcodes::*;
    use rawtx_script::standard::multisig_script;

    /// Accepts a signature for a key when the signature's first byte equals
    /// the key's last byte.
    struct TagChecker;

    impl SignatureChecker for TagChecker {
        fn check_sig(&self, sig: &[u8], pubkey: &[u8], _: &Script, _: SigVersion) -> bool {
            sig.first().is_some() && sig.first() == pubkey.last()
        }
    }

    fn key(tag: u8) -> Vec<u8> {
        let mut k = vec![0x02; 33];
        k[32] = tag;
        k
    }

    fn data(stack: &[Vec<u8>]) -> SignatureData {
        SignatureData {
            script_sig: Script::from_push_stack(stack).expect("push"),
            witness: Vec::new(),
        }
    }

    fn p2pkh() -> Script {
        let mut s = Script::new();
        s.append_opcode(OP_DUP).append_opcode(OP_HASH160);
        s.append_push_data(&[7; 20]).expect("push");
        s.append_opcode(OP_EQUALVERIFY).append_opcode(OP_CHECKSIG);
        s
    }

    #[test]
    fn test_key_hash_prefers_filled_side() {
        let empty = SignatureData::default();
        let signed = data(&[vec![0x30; 71], key(1)]);
        let combined = combine_signatures(&p2pkh(), &TagChecker, &empty, &signed).expect("combine");
        assert_eq!(combined, signed);
        let combined = combine_signatures(&p2pkh(), &TagChecker, &signed, &empty).expect("combine");
        assert_eq!(combined, signed);
    }

    #[test]
    fn test_key_hash_prefers_complete_side_either_order() {
        let truncated = data(&[vec![0x30]]);
        let signed = data(&[vec![0x30; 71], key(1)]);
        let ab = combine_signatures(&p2pkh(), &TagChecker, &truncated, &signed).expect("combine");
        let ba = combine_signatures(&p2pkh(), &TagChecker, &signed, &truncated).expect("combine");
        assert_eq!(ab, signed);
        assert_eq!(ba, signed);
    }

    #[test]
    fn test_key_hash_equal_shape_ties_on_bytes() {
        let low = data(&[vec![0x30, 1], key(1)]);
        let high = data(&[vec![0x30, 2], key(1)]);
        let ab = combine_signatures(&p2pkh(), &TagChecker, &low, &high).expect("combine");
        let ba = combine_signatures(&p2pkh(), &TagChecker, &high, &low).expect("combine");
        assert_eq!(ab, ba);
        assert_eq!(ab, high);
    }

    #[test]
    fn test_script_hash_with_different_redeem_scripts_keeps_fuller() {
        let redeem = multisig_script(1, &[key(1), key(2)]).expect("script");
        let outer = rawtx_script::standard::script_for_destination(&rawtx_script::Destination::ScriptHash(
            rawtx_primitives::hash::hash160(redeem.as_bytes()),
        ));
        let r = redeem.as_bytes().to_vec();
        let good = data(&[vec![], vec![1, 5], r]);
        let junk = data(&[vec![0xde, 0xad]]);
        let ab = combine_signatures(&outer, &TagChecker, &junk, &good).expect("combine");
        let ba = combine_signatures(&outer, &TagChecker, &good, &junk).expect("combine");
        assert_eq!(ab, good);
        assert_eq!(ba, good);
    }

    #[test]
    fn test_multisig_union_in_key_order() {
        let script = multisig_script(2, &[key(1), key(2), key(3)]).expect("script");
        let sig1 = vec![1, 0xaa];
        let sig3 = vec![3, 0xbb];
        let a = data(&[vec![], sig3.clone(), vec![]]);
        let b = data(&[vec![], sig1.clone(), vec![]]);

        let ab = combine_signatures(&script, &TagChecker, &a, &b).expect("combine");
        let ba = combine_signatures(&script, &TagChecker, &b, &a).expect("combine");
        assert_eq!(ab, data(&[vec![], sig1, sig3]));
        assert_eq!(ab, ba);
        assert_eq!(combine_signatures(&script, &TagChecker, &ab, &a).expect("combine"), ab);
    }

    #[test]
    fn test_multisig_drops_invalid_and_caps() {
        let script = multisig_script(1, &[key(1), key(2)]).expect("script");
        let a = data(&[vec![], vec![9, 9]]);
        let b = data(&[vec![], vec![2, 0], vec![1, 0]]);
        let combined = combine_signatures(&script, &TagChecker, &a, &b).expect("combine");
        assert_eq!(combined, data(&[vec![], vec![1, 0]]));
    }

    #[test]
    fn test_script_hash_recurses() {
        let redeem = multisig_script(2, &[key(1), key(2)]).expect("script");
        let outer = rawtx_script::standard::script_for_destination(&rawtx_script::Destination::ScriptHash(
            rawtx_primitives::hash::hash160(redeem.as_bytes()),
        ));
        let r = redeem.as_bytes().to_vec();
        let a = data(&[vec![], vec![1, 5], vec![], r.clone()]);
        let b = data(&[vec![], vec![2, 6], vec![], r.clone()]);
        let combined = combine_signatures(&outer, &TagChecker, &a, &b).expect("combine");
        assert_eq!(combined, data(&[vec![], vec![1, 5], vec![2, 6], r]));
    }

    #[test]
    fn test_witness_script_hash_recurses() {
        let inner = multisig_script(2, &[key(1), key(2)]).expect("script");
        let outer = rawtx_script::standard::script_for_destination(
            &rawtx_script::Destination::WitnessScriptHash(rawtx_primitives::hash::sha256(inner.as_bytes())),
        );
        let w = inner.as_bytes().to_vec();
        let a = SignatureData {
            script_sig: Script::new(),
            witness: vec![vec![], vec![2, 6], w.clone()],
        };
        let b = SignatureData {
            script_sig: Script::new(),
            witness: vec![vec![], vec![1, 5], w.clone()],
        };
        let combined = combine_signatures(&outer, &TagChecker, &a, &b).expect("combine");
        assert!(combined.script_sig.is_empty());
        assert_eq!(combined.witness, vec![vec![], vec![1, 5], vec![2, 6], w]);
    }

    #[test]
    fn test_nonstandard_keeps_longer() {
        let script = Script::from_bytes(&[OP_NOP, OP_1]);
        let short = data(&[vec![1]]);
        let long = data(&[vec![1], vec![2]]);
        assert_eq!(combine_signatures(&script, &TagChecker, &short, &long).expect("combine"), long);
        assert_eq!(combine_signatures(&script, &TagChecker, &long, &short).expect("combine"), long);
    }
}
