//! Signature checking against a transaction input.

use rawtx_primitives::ec::{PublicKey, Signature};
use rawtx_script::Script;
use rawtx_transaction::sighash::{signature_hash, SigVersion};
use rawtx_transaction::Transaction;

/// Verdict on whether `sig` (DER plus trailing sighash byte) was made by
/// `pubkey` over the digest of one input.
pub trait SignatureChecker {
    fn check_sig(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        sig_version: SigVersion,
    ) -> bool;
}

/// Checks signatures for input `input_index` of `tx`, spending `amount`.
#[derive(Clone, Copy, Debug)]
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    input_index: usize,
    amount: u64,
}

impl<'a> TransactionSignatureChecker<'a> {
    pub fn new(tx: &'a Transaction, input_index: usize, amount: u64) -> Self {
        TransactionSignatureChecker {
            tx,
            input_index,
            amount,
        }
    }
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_sig(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        script_code: &Script,
        sig_version: SigVersion,
    ) -> bool {
        let Ok(key) = PublicKey::from_bytes(pubkey) else {
            return false;
        };
        let Some((&hash_type, der)) = sig.split_last() else {
            return false;
        };
        let Ok(signature) = Signature::from_der(der) else {
            return false;
        };
        let Ok(digest) = signature_hash(
            self.tx,
            self.input_index,
            script_code,
            self.amount,
            u32::from(hash_type),
            sig_version,
        ) else {
            return false;
        };
        key.verify(&digest, &signature)
    }
}
