//! Decoded JSON projections of transactions and scripts.
//!
//! These are the structured views returned by the decode operations.
//! Field names and ordering follow the node's RPC output.

use serde::Serialize;

use rawtx_primitives::hash::hash160;
use rawtx_script::{classify, AddressCodec, Destination, Script, ScriptType};

use crate::amount::value_from_amount;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Decoded view of a locking script.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScriptPubKeyView {
    pub asm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    #[serde(rename = "reqSigs", skip_serializing_if = "Option::is_none")]
    pub req_sigs: Option<usize>,
    #[serde(rename = "type")]
    pub script_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<String>>,
}

impl ScriptPubKeyView {
    /// Classify `script` and render its destinations.
    ///
    /// `reqSigs` and `addresses` are present only when the script has at
    /// least one destination.
    pub fn new(
        script: &Script,
        include_hex: bool,
        codec: &dyn AddressCodec,
    ) -> Result<Self, TransactionError> {
        let classification = classify(script);
        let (req_sigs, addresses) = if classification.destinations.is_empty() {
            (None, None)
        } else {
            let addresses = classification
                .destinations
                .iter()
                .map(|d| codec.render_address(d))
                .collect::<Result<Vec<_>, _>>()?;
            (Some(classification.required_sigs), Some(addresses))
        };
        Ok(ScriptPubKeyView {
            asm: script.to_asm(),
            hex: include_hex.then(|| script.to_hex()),
            req_sigs,
            script_type: classification.script_type.name().to_string(),
            addresses,
        })
    }
}

/// `decodescript` result: the script view plus the P2SH address wrapping
/// it, omitted when the script is already P2SH.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScriptView {
    #[serde(flatten)]
    pub script: ScriptPubKeyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p2sh: Option<String>,
}

impl ScriptView {
    pub fn new(script: &Script, codec: &dyn AddressCodec) -> Result<Self, TransactionError> {
        let view = ScriptPubKeyView::new(script, false, codec)?;
        let p2sh = if view.script_type == ScriptType::ScriptHash.name() {
            None
        } else {
            let dest = Destination::ScriptHash(hash160(script.as_bytes()));
            Some(codec.render_address(&dest)?)
        };
        Ok(ScriptView { script: view, p2sh })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScriptSigView {
    pub asm: String,
    pub hex: String,
}

/// One decoded input.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputView {
    Coinbase {
        coinbase: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        txinwitness: Option<Vec<String>>,
        sequence: u32,
    },
    Spend {
        txid: String,
        vout: u32,
        #[serde(rename = "scriptSig")]
        script_sig: ScriptSigView,
        #[serde(skip_serializing_if = "Option::is_none")]
        txinwitness: Option<Vec<String>>,
        sequence: u32,
    },
}

/// One decoded output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputView {
    pub value: f64,
    #[serde(rename = "valueSat")]
    pub value_sat: u64,
    pub n: usize,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKeyView,
}

/// `decoderawtransaction` result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionView {
    pub txid: String,
    /// Witness transaction id.
    pub hash: String,
    pub size: usize,
    pub vsize: usize,
    pub version: i32,
    pub locktime: u32,
    pub vin: Vec<InputView>,
    pub vout: Vec<OutputView>,
}

impl TransactionView {
    pub fn new(tx: &Transaction, codec: &dyn AddressCodec) -> Result<Self, TransactionError> {
        let coinbase = tx.is_coinbase();
        let vin = tx
            .inputs
            .iter()
            .map(|input| {
                let txinwitness = input
                    .has_witness()
                    .then(|| input.witness.iter().map(hex::encode).collect());
                if coinbase {
                    InputView::Coinbase {
                        coinbase: input.unlocking_script.to_hex(),
                        txinwitness,
                        sequence: input.sequence_number,
                    }
                } else {
                    InputView::Spend {
                        txid: input.previous_output.txid.to_string(),
                        vout: input.previous_output.index,
                        script_sig: ScriptSigView {
                            asm: input.unlocking_script.to_asm_decoding_sighash(),
                            hex: input.unlocking_script.to_hex(),
                        },
                        txinwitness,
                        sequence: input.sequence_number,
                    }
                }
            })
            .collect();

        let vout = tx
            .outputs
            .iter()
            .enumerate()
            .map(|(n, output)| {
                Ok(OutputView {
                    value: value_from_amount(output.satoshis as i64),
                    value_sat: output.satoshis,
                    n,
                    script_pub_key: ScriptPubKeyView::new(&output.locking_script, true, codec)?,
                })
            })
            .collect::<Result<Vec<_>, TransactionError>>()?;

        Ok(TransactionView {
            txid: tx.tx_id().to_string(),
            hash: tx.wtx_id().to_string(),
            size: tx.size(),
            vsize: tx.vsize(),
            version: tx.version,
            locktime: tx.lock_time,
            vin,
            vout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawtx_script::{Network, StandardAddressCodec};
    use serde_json::json;

    fn codec() -> StandardAddressCodec {
        StandardAddressCodec::new(Network::Mainnet)
    }

    #[test]
    fn test_p2pkh_view() {
        let script = Script::from_hex("76a914751e76e8199196d454941c45d1b3a323f1433bd688ac").expect("hex");
        let view = ScriptPubKeyView::new(&script, true, &codec()).expect("view");
        assert_eq!(
            serde_json::to_value(&view).expect("json"),
            json!({
                "asm": "OP_DUP OP_HASH160 751e76e8199196d454941c45d1b3a323f1433bd6 OP_EQUALVERIFY OP_CHECKSIG",
                "hex": "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac",
                "reqSigs": 1,
                "type": "pubkeyhash",
                "addresses": ["1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"],
            })
        );
    }

    #[test]
    fn test_nonstandard_view_has_no_destinations() {
        let script = Script::from_bytes(&[0x51, 0x87]);
        let value = serde_json::to_value(ScriptPubKeyView::new(&script, false, &codec()).expect("view"))
            .expect("json");
        assert_eq!(value, json!({ "asm": "1 OP_EQUAL", "type": "nonstandard" }));
    }

    #[test]
    fn test_script_view_p2sh() {
        let script = Script::from_bytes(&[0x51]);
        let view = ScriptView::new(&script, &codec()).expect("view");
        assert!(view.p2sh.as_deref().map_or(false, |a| a.starts_with('3')));

        let p2sh = Script::from_hex("a914751e76e8199196d454941c45d1b3a323f1433bd687").expect("hex");
        let view = ScriptView::new(&p2sh, &codec()).expect("view");
        assert_eq!(view.p2sh, None);
        assert_eq!(view.script.script_type, "scripthash");
    }
}
