//! Raw transaction service.
//!
//! One method per RPC call. Parameters arrive in their JSON shapes, are
//! validated here, and every failure leaves as an [`RpcError`]. Shared
//! node state is reached only through the collaborators in
//! [`NodeBackend`] and only while the state lock is held.

use std::sync::Arc;

use rawtx_primitives::chainhash::{Hash, HASH_HEX_LEN};
use rawtx_script::{Script, StandardAddressCodec};
use rawtx_sign::{
    seed_prevouts, sign_variants, CoinView, CoinsOverlay, KeyStore, PrevOutput, SignError,
    SignResult, StandardScriptVerifier,
};
use rawtx_spv::{build_proof, verify_proof, BlockSource, ChainTracker};
use rawtx_transaction::amount::amount_from_json;
use rawtx_transaction::projection::{ScriptView, TransactionView};
use rawtx_transaction::sighash::{parse_sighash, SIGHASH_ALL};
use rawtx_transaction::{build_raw_transaction, InputRef, OutputIntent, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::NodeConfig;
use crate::error::{RpcError, RpcErrorCode};
use crate::gateway::{AdmissionPolicy, BroadcastGateway, LedgerView, MempoolView, Relay};
use crate::state::StateLock;

/// A transaction found through the transaction index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedTransaction {
    pub transaction: Transaction,
    /// Containing block; `None` for a mempool transaction.
    pub block_hash: Option<Hash>,
}

/// Lookup of any known transaction by id, confirmed or not.
pub trait TransactionIndex {
    fn find_transaction(&self, txid: &Hash) -> Option<IndexedTransaction>;
}

/// The node state the service reads and writes through.
#[derive(Clone)]
pub struct NodeBackend {
    pub coins: Arc<dyn CoinView + Send + Sync>,
    pub mempool: Arc<dyn MempoolView + Send + Sync>,
    pub ledger: Arc<dyn LedgerView + Send + Sync>,
    pub policy: Arc<dyn AdmissionPolicy + Send + Sync>,
    pub relay: Arc<dyn Relay + Send + Sync>,
    pub blocks: Arc<dyn BlockSource + Send + Sync>,
    pub chain: Arc<dyn ChainTracker + Send + Sync>,
    pub tx_index: Arc<dyn TransactionIndex + Send + Sync>,
}

/// Where a looked-up transaction sits relative to the active chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockPlacement {
    /// `-1` when the block is not on the active chain.
    pub height: i64,
    pub confirmations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocktime: Option<u32>,
}

/// Verbose `getrawtransaction` result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerboseTransaction {
    pub hex: String,
    #[serde(flatten)]
    pub view: TransactionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockhash: Option<String>,
    #[serde(flatten)]
    pub placement: Option<BlockPlacement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawTransaction {
    Hex(String),
    Verbose(Box<VerboseTransaction>),
}

#[derive(Deserialize)]
struct PrevTxParam {
    txid: String,
    vout: i64,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(rename = "redeemScript", default)]
    redeem_script: Option<String>,
}

fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_hex(name: &str, text: &str) -> Result<Vec<u8>, RpcError> {
    if !is_hex(text) {
        return Err(RpcError::invalid_parameter(format!(
            "{} must be hexadecimal string (not '{}')",
            name, text
        )));
    }
    hex::decode(text).map_err(|e| RpcError::invalid_parameter(format!("{}: {}", name, e)))
}

fn parse_hash(name: &str, text: &str) -> Result<Hash, RpcError> {
    parse_hex(name, text)?;
    if text.len() != HASH_HEX_LEN {
        return Err(RpcError::invalid_parameter(format!(
            "{} must be of length {} (not {})",
            name,
            HASH_HEX_LEN,
            text.len()
        )));
    }
    Hash::from_hex_exact(text).map_err(|e| RpcError::invalid_parameter(e.to_string()))
}

fn parse_input(value: &Value) -> Result<InputRef, RpcError> {
    let obj = value
        .as_object()
        .ok_or_else(|| RpcError::new(RpcErrorCode::TypeError, "Expected object for input"))?;

    let txid = parse_hash("txid", obj.get("txid").and_then(Value::as_str).unwrap_or_default())?;
    let vout = obj
        .get("vout")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::invalid_parameter("Invalid parameter, missing vout key"))?;
    let sequence = match obj.get("sequence") {
        Some(Value::Number(n)) => Some(n.as_i64().ok_or_else(|| {
            RpcError::invalid_parameter("Invalid parameter, sequence number is out of range")
        })?),
        _ => None,
    };
    Ok(InputRef {
        txid,
        vout,
        sequence,
    })
}

fn parse_prevtx(value: &Value) -> Result<PrevOutput, RpcError> {
    if !value.is_object() {
        return Err(RpcError::deserialization(
            "expected object with {\"txid'\",\"vout\",\"scriptPubKey\"}",
        ));
    }
    let param: PrevTxParam = serde_json::from_value(value.clone())
        .map_err(|e| RpcError::new(RpcErrorCode::TypeError, e.to_string()))?;

    let amount = match &param.amount {
        Some(value) => amount_from_json(value)?,
        None => 0,
    };
    let redeem_script = param
        .redeem_script
        .as_deref()
        .map(|text| parse_hex("redeemScript", text).map(Script::from))
        .transpose()?;

    Ok(PrevOutput {
        txid: parse_hash("txid", &param.txid)?,
        vout: param.vout,
        script_pub_key: Script::from(parse_hex("scriptPubKey", &param.script_pub_key)?),
        amount,
        redeem_script,
    })
}

/// The raw transaction RPC surface over a node backend.
pub struct RawTransactionService {
    config: NodeConfig,
    codec: StandardAddressCodec,
    lock: StateLock,
    backend: NodeBackend,
    keystore: Option<KeyStore>,
}

impl RawTransactionService {
    pub fn new(config: NodeConfig, backend: NodeBackend) -> Self {
        let codec = config.address_codec();
        RawTransactionService {
            config,
            codec,
            lock: StateLock::new(),
            backend,
            keystore: None,
        }
    }

    /// Share `lock` with the rest of the node.
    pub fn with_lock(mut self, lock: StateLock) -> Self {
        self.lock = lock;
        self
    }

    /// Node key store, used for signing when a request carries no keys.
    pub fn with_keystore(mut self, keystore: KeyStore) -> Self {
        self.keystore = Some(keystore);
        self
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state_lock(&self) -> &StateLock {
        &self.lock
    }

    /// `createrawtransaction`: build an unsigned transaction.
    ///
    /// `outputs` maps address text to an amount, or the key `"data"` to a
    /// hex payload. Keys keep their given order.
    pub fn create_raw_transaction(
        &self,
        inputs: &[Value],
        outputs: &Map<String, Value>,
        lock_time: Option<i64>,
    ) -> Result<String, RpcError> {
        let inputs = inputs.iter().map(parse_input).collect::<Result<Vec<_>, _>>()?;

        let mut intents = Vec::with_capacity(outputs.len());
        for (name, value) in outputs {
            if name == "data" {
                let payload = parse_hex("Data", value.as_str().unwrap_or_default())?;
                intents.push(OutputIntent::Data(payload));
            } else {
                intents.push(OutputIntent::Pay {
                    address: name.clone(),
                    amount: amount_from_json(value)?,
                });
            }
        }

        let tx = build_raw_transaction(&inputs, &intents, lock_time, &self.codec)?;
        Ok(tx.to_hex())
    }

    /// `decoderawtransaction`.
    pub fn decode_raw_transaction(&self, tx_hex: &str) -> Result<TransactionView, RpcError> {
        let tx = Transaction::from_hex(tx_hex)
            .map_err(|_| RpcError::deserialization("TX decode failed"))?;
        Ok(TransactionView::new(&tx, &self.codec)?)
    }

    /// `decodescript`. An empty string is the empty script.
    pub fn decode_script(&self, script_hex: &str) -> Result<ScriptView, RpcError> {
        let script = if script_hex.is_empty() {
            Script::default()
        } else {
            Script::from(parse_hex("argument", script_hex)?)
        };
        Ok(ScriptView::new(&script, &self.codec)?)
    }

    /// `signrawtransaction`.
    ///
    /// `tx_hex` may hold several concatenated encodings of the same
    /// transaction; their signatures are merged into the first. Without
    /// `keys`, the node key store signs if one is configured.
    pub fn sign_raw_transaction(
        &self,
        tx_hex: &str,
        prevtxs: Option<&[Value]>,
        keys: Option<&[String]>,
        sighash: Option<&str>,
    ) -> Result<SignResult, RpcError> {
        let bytes = hex::decode(tx_hex).map_err(|_| {
            RpcError::invalid_parameter(format!(
                "argument 1 must be hexadecimal string (not '{}')",
                tx_hex
            ))
        })?;
        let variants = Transaction::read_all(&bytes)
            .map_err(|_| RpcError::deserialization("TX decode failed"))?;
        let base = variants.first().ok_or(SignError::MissingTransaction)?;

        let mut coins = {
            let _guard = self.lock.lock();
            let outpoints = base.inputs.iter().map(|input| &input.previous_output);
            CoinsOverlay::snapshot(self.backend.coins.as_ref(), outpoints)
        };

        let (mut keystore, keys_given) = match keys {
            Some(wifs) => (
                KeyStore::from_wifs(wifs, self.config.secret_key_prefix())?,
                true,
            ),
            None => (self.keystore.clone().unwrap_or_default(), false),
        };

        let prevouts = prevtxs
            .unwrap_or_default()
            .iter()
            .map(parse_prevtx)
            .collect::<Result<Vec<_>, _>>()?;
        seed_prevouts(&mut coins, &mut keystore, &prevouts, keys_given)?;

        let hash_type = match sighash {
            Some(mode) => parse_sighash(mode)?,
            None => SIGHASH_ALL,
        };

        let outcome = sign_variants(&variants, &keystore, &coins, hash_type, &StandardScriptVerifier)?;
        tracing::debug!(
            variants = variants.len(),
            inputs = outcome.transaction.inputs.len(),
            complete = outcome.complete,
            errors = outcome.errors.len(),
            "signed raw transaction"
        );
        Ok(outcome.to_result())
    }

    /// `sendrawtransaction`: returns the txid.
    pub fn send_raw_transaction(&self, tx_hex: &str, allow_high_fees: bool) -> Result<String, RpcError> {
        let gateway = BroadcastGateway::new(
            self.backend.mempool.as_ref(),
            self.backend.ledger.as_ref(),
            self.backend.policy.as_ref(),
            self.backend.relay.as_ref(),
            &self.lock,
            self.config.max_tx_fee,
        );
        let txid = gateway.send_hex(tx_hex, allow_high_fees)?;
        Ok(txid.to_string())
    }

    /// `gettxoutproof`: hex-encoded proof that every txid is in one block.
    pub fn get_tx_out_proof(&self, txids: &[String], block_hash: Option<&str>) -> Result<String, RpcError> {
        let _guard = self.lock.lock();
        let proof = build_proof(txids, block_hash, self.backend.blocks.as_ref())?;
        Ok(proof.to_hex())
    }

    /// `verifytxoutproof`: the txids a proof commits to.
    pub fn verify_tx_out_proof(&self, proof_hex: &str) -> Result<Vec<String>, RpcError> {
        let _guard = self.lock.lock();
        let txids = verify_proof(proof_hex, self.backend.chain.as_ref())?;
        Ok(txids.iter().map(Hash::to_string).collect())
    }

    /// `getrawtransaction`.
    pub fn get_raw_transaction(&self, txid: &str, verbose: bool) -> Result<RawTransaction, RpcError> {
        let hash = parse_hash("parameter 1", txid)?;

        let (found, placement) = {
            let _guard = self.lock.lock();
            let found = self.backend.tx_index.find_transaction(&hash).ok_or_else(|| {
                RpcError::new(
                    RpcErrorCode::InvalidAddressOrKey,
                    "No information available about transaction",
                )
            })?;
            let placement = match &found.block_hash {
                Some(block_hash) => Some(self.placement(block_hash)?),
                None => None,
            };
            (found, placement)
        };

        let hex = found.transaction.to_hex();
        if !verbose {
            return Ok(RawTransaction::Hex(hex));
        }
        Ok(RawTransaction::Verbose(Box::new(VerboseTransaction {
            hex,
            view: TransactionView::new(&found.transaction, &self.codec)?,
            blockhash: found.block_hash.map(|h| h.to_string()),
            placement,
        })))
    }

    fn placement(&self, block_hash: &Hash) -> Result<BlockPlacement, RpcError> {
        let block = self.backend.blocks.lookup_block(block_hash);
        if let Some(block) = block {
            if self.backend.chain.is_in_active_chain(block_hash)? {
                let tip = self.backend.chain.current_height()?;
                return Ok(BlockPlacement {
                    height: i64::from(block.height),
                    confirmations: 1 + tip.saturating_sub(block.height),
                    time: Some(block.time),
                    blocktime: Some(block.time),
                });
            }
        }
        Ok(BlockPlacement {
            height: -1,
            confirmations: 0,
            time: None,
            blocktime: None,
        })
    }
}
