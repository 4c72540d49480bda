//! Unsigned transaction construction from input references and output
//! intents.

use std::collections::HashSet;

use rawtx_primitives::chainhash::Hash;
use rawtx_script::standard::{null_data_script, script_for_destination};
use rawtx_script::AddressCodec;

use crate::input::{OutPoint, TransactionInput, SEQUENCE_FINAL};
use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

/// A prior output to spend.
///
/// `vout` and `sequence` are kept wide so that out-of-range caller values
/// are reported rather than truncated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRef {
    pub txid: Hash,
    pub vout: i64,
    pub sequence: Option<i64>,
}

/// One requested output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputIntent {
    /// Pay `amount` base units to address text.
    Pay { address: String, amount: u64 },
    /// A zero-value `OP_RETURN <payload>` output. May repeat.
    Data(Vec<u8>),
}

/// Build an unsigned transaction.
///
/// Every parameter is validated before anything is constructed:
/// the lock time must fit in 32 bits, output indices and sequence
/// overrides must be in range, and each address must parse and appear at
/// most once, compared by the destination it decodes to.
///
/// Inputs without a sequence override get `0xFFFFFFFF`, or `0xFFFFFFFE`
/// when a non-zero lock time is set so that the lock time is enforced.
pub fn build_raw_transaction(
    inputs: &[InputRef],
    outputs: &[OutputIntent],
    lock_time: Option<i64>,
    codec: &dyn AddressCodec,
) -> Result<Transaction, TransactionError> {
    let lock_time = match lock_time {
        None => 0,
        Some(value) => u32::try_from(value).map_err(|_| {
            TransactionError::InvalidParameter("Invalid parameter, locktime out of range".into())
        })?,
    };

    let default_sequence = if lock_time != 0 {
        SEQUENCE_FINAL - 1
    } else {
        SEQUENCE_FINAL
    };

    let mut tx_inputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let index = u32::try_from(input.vout).map_err(|_| {
            TransactionError::InvalidParameter("Invalid parameter, vout must be positive".into())
        })?;
        let sequence = match input.sequence {
            None => default_sequence,
            Some(value) => u32::try_from(value).map_err(|_| {
                TransactionError::InvalidParameter(
                    "Invalid parameter, sequence number is out of range".into(),
                )
            })?,
        };
        tx_inputs.push(TransactionInput::new(OutPoint::new(input.txid, index), sequence));
    }

    let mut seen = HashSet::new();
    let mut tx_outputs = Vec::with_capacity(outputs.len());
    for intent in outputs {
        let output = match intent {
            OutputIntent::Data(payload) => TransactionOutput::new(0, null_data_script(payload)?),
            OutputIntent::Pay { address, amount } => {
                let dest = codec
                    .classify_address(address)
                    .ok_or_else(|| TransactionError::InvalidAddress(address.clone()))?;
                if !seen.insert(dest) {
                    return Err(TransactionError::InvalidParameter(format!(
                        "Invalid parameter, duplicated address: {}",
                        address
                    )));
                }
                TransactionOutput::new(*amount, script_for_destination(&dest))
            }
        };
        tx_outputs.push(output);
    }

    tracing::debug!(
        inputs = tx_inputs.len(),
        outputs = tx_outputs.len(),
        lock_time,
        "built raw transaction"
    );

    Ok(Transaction {
        version: 1,
        inputs: tx_inputs,
        outputs: tx_outputs,
        lock_time,
    })
}
