//! Multi-source signing.
//!
//! Several parties may each hold a copy of the same unsigned transaction
//! and attach their own partial signatures. `sign_variants` takes every
//! copy, signs what the available keys can sign, merges in whatever each
//! copy already carries and verifies each input as it goes. The first
//! copy is the base that accumulates the result.
//!
//! Lookup and verification failures are recorded per input and never
//! abort the call; only malformed requests do.

use rawtx_primitives::chainhash::Hash;
use rawtx_script::Script;
use rawtx_transaction::sighash::{SIGHASH_MASK, SIGHASH_SINGLE};
use rawtx_transaction::{OutPoint, Transaction, TransactionInput};
use serde::Serialize;

use crate::checker::TransactionSignatureChecker;
use crate::coins::{Coin, CoinsOverlay};
use crate::combine::combine_signatures;
use crate::keystore::{KeyStore, SigningProvider};
use crate::producer::{produce_signature, SignatureCreator};
use crate::sigdata::SignatureData;
use crate::verifier::ScriptVerifier;
use crate::SignError;

/// Error text for an input whose prior output cannot be resolved.
pub const INPUT_NOT_FOUND: &str = "Input not found or already spent";

/// A caller-described prior output, for coins the shared view cannot see
/// yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrevOutput {
    pub txid: Hash,
    pub vout: i64,
    pub script_pub_key: Script,
    pub amount: u64,
    pub redeem_script: Option<Script>,
}

impl PrevOutput {
    fn outpoint(&self) -> Result<OutPoint, SignError> {
        let index = u32::try_from(self.vout)
            .map_err(|_| SignError::InvalidPrevout("vout must be positive".to_string()))?;
        Ok(OutPoint::new(self.txid, index))
    }

    /// True when the locking script commits to a script the signer must be
    /// told about: P2SH or witness v0 script-hash.
    fn wraps_script(&self) -> bool {
        self.script_pub_key.is_p2sh()
            || matches!(self.script_pub_key.witness_program(), Some((0, p)) if p.len() == 32)
    }
}

/// Write `prevouts` into the request's overlay.
///
/// Redeem scripts go into `keystore` only when `keys_given` is set and the
/// descriptor's locking script wraps a script. A descriptor that
/// contradicts a visible coin rejects the whole request.
pub fn seed_prevouts(
    coins: &mut CoinsOverlay,
    keystore: &mut KeyStore,
    prevouts: &[PrevOutput],
    keys_given: bool,
) -> Result<(), SignError> {
    for prevout in prevouts {
        let outpoint = prevout.outpoint()?;
        coins.add_coin(
            outpoint,
            Coin {
                locking_script: prevout.script_pub_key.clone(),
                amount: prevout.amount,
            },
        )?;
        if keys_given && prevout.wraps_script() {
            if let Some(redeem) = &prevout.redeem_script {
                keystore.add_script(redeem.clone());
            }
        }
    }
    Ok(())
}

/// A per-input failure in a signing result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputError {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptSig")]
    pub script_sig: String,
    pub sequence: u32,
    pub error: String,
}

impl InputError {
    fn new(input: &TransactionInput, error: impl Into<String>) -> Self {
        InputError {
            txid: input.previous_output.txid.to_string(),
            vout: input.previous_output.index,
            script_sig: input.unlocking_script.to_hex(),
            sequence: input.sequence_number,
            error: error.into(),
        }
    }
}

/// The merged transaction and what is still wrong with it.
#[derive(Clone, Debug)]
pub struct SignOutcome {
    pub transaction: Transaction,
    pub complete: bool,
    pub errors: Vec<InputError>,
}

/// Serialized signing result.
#[derive(Clone, Debug, Serialize)]
pub struct SignResult {
    pub hex: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<InputError>,
}

impl SignOutcome {
    pub fn to_result(&self) -> SignResult {
        SignResult {
            hex: self.transaction.to_hex(),
            complete: self.complete,
            errors: self.errors.clone(),
        }
    }
}

/// Sign and merge `variants` input by input.
///
/// For each input of the base variant the prior output is looked up in
/// `coins`. Fresh material is produced with `provider` (skipped under
/// SINGLE for inputs without a matching output), then merged with the
/// material of every variant long enough to have that input, applied to
/// the base, and verified.
pub fn sign_variants(
    variants: &[Transaction],
    provider: &dyn SigningProvider,
    coins: &CoinsOverlay,
    hash_type: u32,
    verifier: &dyn ScriptVerifier,
) -> Result<SignOutcome, SignError> {
    let Some(base) = variants.first() else {
        return Err(SignError::MissingTransaction);
    };
    let unsigned = base.clone();
    let mut merged = base.clone();
    let hash_single = hash_type & SIGHASH_MASK == SIGHASH_SINGLE;
    let mut errors = Vec::new();

    for i in 0..merged.inputs.len() {
        let outpoint = merged.inputs[i].previous_output;
        let Some(coin) = coins.get(&outpoint) else {
            tracing::debug!(input = i, %outpoint, "prior output not found");
            errors.push(InputError::new(&merged.inputs[i], INPUT_NOT_FOUND));
            continue;
        };

        let mut data = SignatureData::default();
        if !hash_single || i < merged.outputs.len() {
            let creator = SignatureCreator::new(provider, &unsigned, i, coin.amount, hash_type);
            let (_, produced) = produce_signature(&creator, &coin.locking_script)?;
            data = produced;
        }

        let checker = TransactionSignatureChecker::new(&unsigned, i, coin.amount);
        for variant in variants.iter().filter(|v| v.inputs.len() > i) {
            data = combine_signatures(
                &coin.locking_script,
                &checker,
                &data,
                &SignatureData::from_input(variant, i),
            )?;
        }
        data.apply_to(&mut merged, i);

        let input = &merged.inputs[i];
        if let Err(failure) =
            verifier.verify_script(&input.unlocking_script, &coin.locking_script, &input.witness, &checker)
        {
            tracing::debug!(input = i, %outpoint, reason = %failure, "input does not verify");
            errors.push(InputError::new(input, failure.to_string()));
        }
    }

    let complete = errors.is_empty();
    tracing::debug!(
        inputs = merged.inputs.len(),
        variants = variants.len(),
        complete,
        "signed transaction"
    );
    Ok(SignOutcome {
        transaction: merged,
        complete,
        errors,
    })
}
