//! End-to-end tests of the raw transaction service over an in-memory node.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::ec::PrivateKey;
use rawtx_script::standard::{multisig_script, script_for_destination};
use rawtx_script::{AddressCodec, Destination, Network, Script};
use rawtx_sign::signer::INPUT_NOT_FOUND;
use rawtx_sign::{Coin, CoinView, KeyStore};
use rawtx_spv::{Block, BlockHeader, BlockRef, BlockSource, ChainTracker, SpvError};
use rawtx_transaction::{OutPoint, Transaction};
use serde_json::{json, Map, Value};

use crate::{
    AdmissionPolicy, IndexedTransaction, LedgerView, MempoolView, NodeBackend, NodeConfig,
    RawTransaction, RawTransactionService, Rejection, Relay, RpcErrorCode, TransactionIndex,
};

// -----------------------------------------------------------------------
// In-memory node
// -----------------------------------------------------------------------

#[derive(Default)]
struct MemoryNode {
    coins: Mutex<HashMap<OutPoint, Coin>>,
    mempool: Mutex<HashSet<Hash>>,
    confirmed: Mutex<HashSet<Hash>>,
    verdict: Mutex<Option<Rejection>>,
    admitted: Mutex<Vec<Option<u64>>>,
    relayed: Mutex<Vec<Hash>>,
    blocks: Mutex<HashMap<Hash, (u32, Block)>>,
    anchors: Mutex<HashMap<Hash, Hash>>,
    active: Mutex<HashSet<Hash>>,
    tip: Mutex<u32>,
    index: Mutex<HashMap<Hash, IndexedTransaction>>,
}

impl MemoryNode {
    fn add_block(&self, height: u32, block: Block, active: bool) -> Hash {
        let hash = block.hash();
        for txid in block.txids() {
            self.anchors.lock().insert(txid, hash);
        }
        for tx in &block.transactions {
            self.index.lock().insert(
                tx.tx_id(),
                IndexedTransaction {
                    transaction: tx.clone(),
                    block_hash: Some(hash),
                },
            );
        }
        self.blocks.lock().insert(hash, (height, block));
        if active {
            self.active.lock().insert(hash);
            let mut tip = self.tip.lock();
            *tip = (*tip).max(height);
        }
        hash
    }
}

impl CoinView for MemoryNode {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.lock().get(outpoint).cloned()
    }
}

impl MempoolView for MemoryNode {
    fn contains(&self, txid: &Hash) -> bool {
        self.mempool.lock().contains(txid)
    }
}

impl LedgerView for MemoryNode {
    fn is_confirmed(&self, txid: &Hash) -> bool {
        self.confirmed.lock().contains(txid)
    }
}

impl AdmissionPolicy for MemoryNode {
    fn admit(&self, tx: &Transaction, fee_cap: Option<u64>) -> Result<(), Rejection> {
        self.admitted.lock().push(fee_cap);
        if let Some(rejection) = self.verdict.lock().clone() {
            return Err(rejection);
        }
        self.mempool.lock().insert(tx.tx_id());
        Ok(())
    }
}

impl Relay for MemoryNode {
    fn relay(&self, tx: &Transaction) {
        self.relayed.lock().push(tx.tx_id());
    }
}

impl BlockSource for MemoryNode {
    fn lookup_block(&self, block_hash: &Hash) -> Option<BlockRef> {
        self.blocks.lock().get(block_hash).map(|(height, block)| BlockRef {
            hash: *block_hash,
            height: *height,
            time: block.header.time,
        })
    }

    fn lookup_block_by_anchor(&self, txid: &Hash) -> Option<BlockRef> {
        let hash = *self.anchors.lock().get(txid)?;
        self.lookup_block(&hash)
    }

    fn read_block(&self, block: &BlockRef) -> Result<Block, SpvError> {
        self.blocks
            .lock()
            .get(&block.hash)
            .map(|(_, b)| b.clone())
            .ok_or(SpvError::BlockNotFound)
    }
}

impl ChainTracker for MemoryNode {
    fn is_in_active_chain(&self, block_hash: &Hash) -> Result<bool, SpvError> {
        Ok(self.active.lock().contains(block_hash))
    }

    fn current_height(&self) -> Result<u32, SpvError> {
        Ok(*self.tip.lock())
    }
}

impl TransactionIndex for MemoryNode {
    fn find_transaction(&self, txid: &Hash) -> Option<IndexedTransaction> {
        self.index.lock().get(txid).cloned()
    }
}

fn backend(node: &Arc<MemoryNode>) -> NodeBackend {
    NodeBackend {
        coins: node.clone(),
        mempool: node.clone(),
        ledger: node.clone(),
        policy: node.clone(),
        relay: node.clone(),
        blocks: node.clone(),
        chain: node.clone(),
        tx_index: node.clone(),
    }
}

fn service(node: &Arc<MemoryNode>) -> RawTransactionService {
    RawTransactionService::new(NodeConfig::default(), backend(node))
}

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

fn key(n: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[n; 32], true).expect("valid scalar")
}

fn wif(k: &PrivateKey) -> String {
    k.to_wif(Network::Mainnet.params().secret_key_prefix)
}

fn pkh(k: &PrivateKey) -> Script {
    script_for_destination(&Destination::KeyHash(k.pub_key().hash160()))
}

fn address(svc: &RawTransactionService, k: &PrivateKey) -> String {
    svc.config()
        .address_codec()
        .render_address(&Destination::KeyHash(k.pub_key().hash160()))
        .expect("render")
}

fn prev(n: u8) -> Hash {
    Hash::new([n; 32])
}

fn input(n: u8, vout: u32) -> Value {
    json!({"txid": prev(n).to_string(), "vout": vout})
}

fn pay(address: String, amount: Value) -> Map<String, Value> {
    let mut outputs = Map::new();
    outputs.insert(address, amount);
    outputs
}

fn prevtx(n: u8, vout: u32, script: &Script, amount: f64) -> Value {
    json!({
        "txid": prev(n).to_string(),
        "vout": vout,
        "scriptPubKey": script.to_hex(),
        "amount": amount,
    })
}

fn block_with(n: u32, seed: u32) -> Block {
    let transactions = (0..n)
        .map(|i| {
            let mut tx = Transaction::new();
            tx.lock_time = seed * 1000 + i;
            tx
        })
        .collect();
    let mut block = Block::new(
        BlockHeader {
            version: 4,
            time: 1_600_000_000 + seed,
            ..BlockHeader::default()
        },
        transactions,
    );
    block.header.merkle_root = block.compute_merkle_root();
    block
}

// -----------------------------------------------------------------------
// createrawtransaction / decoderawtransaction / decodescript
// -----------------------------------------------------------------------

#[test]
fn test_create_then_decode() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);

    let mut outputs = pay(address(&svc, &key(1)), json!(0.5));
    outputs.insert("data".into(), json!("cafe"));
    let inputs = [input(1, 0), json!({"txid": prev(2).to_string(), "vout": 2, "sequence": 7})];

    let hex = svc
        .create_raw_transaction(&inputs, &outputs, Some(500_000))
        .expect("create");
    let view = serde_json::to_value(svc.decode_raw_transaction(&hex).expect("decode")).expect("json");

    assert_eq!(view["locktime"], json!(500_000));
    assert_eq!(view["vin"][0]["txid"], json!(prev(1).to_string()));
    assert_eq!(view["vin"][0]["sequence"], json!(0xFFFF_FFFEu32));
    assert_eq!(view["vin"][1]["sequence"], json!(7));
    assert_eq!(view["vout"][0]["valueSat"], json!(50_000_000));
    assert_eq!(view["vout"][0]["scriptPubKey"]["type"], json!("pubkeyhash"));
    assert_eq!(
        view["vout"][0]["scriptPubKey"]["addresses"],
        json!([address(&svc, &key(1))])
    );
    assert_eq!(view["vout"][1]["valueSat"], json!(0));
    assert_eq!(view["vout"][1]["scriptPubKey"]["type"], json!("nulldata"));
    assert_eq!(view["vout"][1]["scriptPubKey"]["hex"], json!("6a02cafe"));
}

#[test]
fn test_create_rejects_bad_parameters() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let outputs = pay(address(&svc, &key(1)), json!(1));

    let err = svc
        .create_raw_transaction(&[json!({"txid": prev(1).to_string()})], &outputs, None)
        .expect_err("no vout");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);
    assert_eq!(err.message, "Invalid parameter, missing vout key");

    let err = svc
        .create_raw_transaction(&[json!({"txid": "xyz", "vout": 0})], &outputs, None)
        .expect_err("bad txid");
    assert_eq!(err.message, "txid must be hexadecimal string (not 'xyz')");

    let err = svc
        .create_raw_transaction(&[json!({"txid": "abcd", "vout": 0})], &outputs, None)
        .expect_err("short txid");
    assert_eq!(err.message, "txid must be of length 64 (not 4)");

    let err = svc
        .create_raw_transaction(&[input(1, 0)], &outputs, Some(4_294_967_296))
        .expect_err("lock time");
    assert_eq!(err.message, "Invalid parameter, locktime out of range");

    let err = svc
        .create_raw_transaction(&[json!({"txid": prev(1).to_string(), "vout": -1})], &outputs, None)
        .expect_err("negative vout");
    assert_eq!(err.message, "Invalid parameter, vout must be positive");

    let err = svc
        .create_raw_transaction(&[input(1, 0)], &pay("not-an-address".into(), json!(1)), None)
        .expect_err("address");
    assert_eq!(err.code, RpcErrorCode::InvalidAddressOrKey);

    let err = svc
        .create_raw_transaction(&[input(1, 0)], &pay(address(&svc, &key(1)), json!(-1)), None)
        .expect_err("amount");
    assert_eq!(err.code, RpcErrorCode::TypeError);

    let err = svc
        .create_raw_transaction(&[input(1, 0)], &pay("data".into(), json!("xyz")), None)
        .expect_err("data");
    assert_eq!(err.message, "Data must be hexadecimal string (not 'xyz')");
}

#[test]
fn test_decode_rejects_garbage() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    for bad in ["", "zz", "0100"] {
        let err = svc.decode_raw_transaction(bad).expect_err("garbage");
        assert_eq!(err.code, RpcErrorCode::DeserializationError);
        assert_eq!(err.message, "TX decode failed");
    }
}

#[test]
fn test_decode_script() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);

    let view = serde_json::to_value(svc.decode_script(&pkh(&key(1)).to_hex()).expect("decode")).expect("json");
    assert_eq!(view["type"], json!("pubkeyhash"));
    assert_eq!(view["reqSigs"], json!(1));
    assert!(view["p2sh"].as_str().expect("p2sh").starts_with('3'));
    assert!(view.get("hex").is_none());

    let empty = svc.decode_script("").expect("empty");
    assert_eq!(empty.script.asm, "");

    let err = svc.decode_script("abc").expect_err("odd length");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);
}

// -----------------------------------------------------------------------
// signrawtransaction
// -----------------------------------------------------------------------

#[test]
fn test_sign_then_send() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let k = key(1);

    let unsigned = svc
        .create_raw_transaction(&[input(1, 0)], &pay(address(&svc, &key(2)), json!(0.4)), None)
        .expect("create");
    let prevtxs = [prevtx(1, 0, &pkh(&k), 0.5)];
    let signed = svc
        .sign_raw_transaction(&unsigned, Some(&prevtxs), Some(&[wif(&k)]), None)
        .expect("sign");
    assert!(signed.complete);
    assert!(signed.errors.is_empty());

    let txid = svc.send_raw_transaction(&signed.hex, false).expect("send");
    let tx = Transaction::from_hex(&signed.hex).expect("decode");
    assert_eq!(txid, tx.tx_id().to_string());
    assert_eq!(*node.admitted.lock(), vec![Some(10_000_000)]);
    assert_eq!(node.relayed.lock().len(), 1);

    // Already in the pool: not resubmitted, relayed again.
    assert_eq!(svc.send_raw_transaction(&signed.hex, false).expect("resend"), txid);
    assert_eq!(node.admitted.lock().len(), 1);
    assert_eq!(node.relayed.lock().len(), 2);

    node.confirmed.lock().insert(tx.tx_id());
    let err = svc.send_raw_transaction(&signed.hex, false).expect_err("confirmed");
    assert_eq!(err.code, RpcErrorCode::TransactionAlreadyInChain);
    assert_eq!(err.message, "transaction already in block chain");
}

#[test]
fn test_send_rejections() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let tx = block_with(1, 9).transactions[0].to_hex();

    *node.verdict.lock() = Some(Rejection::Invalid {
        code: 64,
        reason: "non-final".into(),
    });
    let err = svc.send_raw_transaction(&tx, true).expect_err("rejected");
    assert_eq!(err.code, RpcErrorCode::TransactionRejected);
    assert_eq!(err.message, "64: non-final");
    assert_eq!(*node.admitted.lock(), vec![None]);

    *node.verdict.lock() = Some(Rejection::MissingInputs);
    let err = svc.send_raw_transaction(&tx, false).expect_err("missing");
    assert_eq!(err.code, RpcErrorCode::TransactionError);
    assert_eq!(err.message, "Missing inputs");

    let err = svc.send_raw_transaction("00", false).expect_err("decode");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);
    assert!(node.relayed.lock().is_empty());
}

#[test]
fn test_sign_with_node_coins_and_keystore() {
    let node = Arc::new(MemoryNode::default());
    let k = key(3);
    node.coins.lock().insert(
        OutPoint::new(prev(3), 1),
        Coin {
            locking_script: pkh(&k),
            amount: 1_000,
        },
    );

    let bare = service(&node);
    let unsigned = bare
        .create_raw_transaction(&[input(3, 1)], &pay(address(&bare, &key(4)), json!("0.000009")), None)
        .expect("create");
    let result = bare.sign_raw_transaction(&unsigned, None, None, None).expect("sign");
    assert!(!result.complete);
    assert_eq!(result.errors.len(), 1);

    let mut keystore = KeyStore::new();
    keystore.add_key(k);
    let wallet = service(&node).with_keystore(keystore);
    let result = wallet.sign_raw_transaction(&unsigned, None, None, None).expect("sign");
    assert!(result.complete);
}

#[test]
fn test_sign_reports_missing_coin_per_input() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let k = key(1);

    let unsigned = svc
        .create_raw_transaction(
            &[input(1, 0), input(7, 3)],
            &pay(address(&svc, &key(2)), json!(0.1)),
            None,
        )
        .expect("create");
    let prevtxs = [prevtx(1, 0, &pkh(&k), 0.5)];
    let result = svc
        .sign_raw_transaction(&unsigned, Some(&prevtxs), Some(&[wif(&k)]), Some("ALL"))
        .expect("sign");

    assert!(!result.complete);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].txid, prev(7).to_string());
    assert_eq!(result.errors[0].vout, 3);
    assert_eq!(result.errors[0].error, INPUT_NOT_FOUND);

    let tx = Transaction::from_hex(&result.hex).expect("decode");
    assert!(!tx.inputs[0].unlocking_script.as_bytes().is_empty());
    assert!(tx.inputs[1].unlocking_script.as_bytes().is_empty());
}

#[test]
fn test_sign_merges_parties() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let (a, b) = (key(5), key(6));
    let script = multisig_script(2, &[a.pub_key().to_bytes(), b.pub_key().to_bytes()]).expect("script");

    let unsigned = svc
        .create_raw_transaction(&[input(5, 0)], &pay(address(&svc, &key(2)), json!(1)), None)
        .expect("create");
    let prevtxs = [prevtx(5, 0, &script, 2.0)];

    let by_a = svc
        .sign_raw_transaction(&unsigned, Some(&prevtxs), Some(&[wif(&a)]), None)
        .expect("a signs");
    let by_b = svc
        .sign_raw_transaction(&unsigned, Some(&prevtxs), Some(&[wif(&b)]), None)
        .expect("b signs");
    assert!(!by_a.complete);
    assert!(!by_b.complete);

    let combined = format!("{}{}", by_a.hex, by_b.hex);
    let merged = svc
        .sign_raw_transaction(&combined, Some(&prevtxs), Some(&[]), None)
        .expect("merge");
    assert!(merged.complete, "{:?}", merged.errors);

    let reversed = format!("{}{}", by_b.hex, by_a.hex);
    let merged_ba = svc
        .sign_raw_transaction(&reversed, Some(&prevtxs), Some(&[]), None)
        .expect("merge");
    assert_eq!(merged.hex, merged_ba.hex);
}

#[test]
fn test_sign_request_errors() {
    let node = Arc::new(MemoryNode::default());
    let svc = service(&node);
    let unsigned = svc
        .create_raw_transaction(&[input(1, 0)], &pay(address(&svc, &key(2)), json!(0.1)), None)
        .expect("create");

    let err = svc.sign_raw_transaction("", None, None, None).expect_err("empty");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);
    assert_eq!(err.message, "Missing transaction");

    let err = svc.sign_raw_transaction("0100", None, None, None).expect_err("truncated");
    assert_eq!(err.message, "TX decode failed");

    let err = svc.sign_raw_transaction("zz", None, None, None).expect_err("not hex");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);

    let err = svc
        .sign_raw_transaction(&unsigned, None, None, Some("ALL|NONE"))
        .expect_err("sighash");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);
    assert_eq!(err.message, "Invalid sighash param");

    let testnet_wif = key(1).to_wif(Network::Testnet.params().secret_key_prefix);
    for bad in ["garbage".to_string(), testnet_wif] {
        let err = svc
            .sign_raw_transaction(&unsigned, None, Some(&[bad]), None)
            .expect_err("key");
        assert_eq!(err.code, RpcErrorCode::InvalidAddressOrKey);
        assert_eq!(err.message, "Invalid private key");
    }

    let err = svc
        .sign_raw_transaction(&unsigned, Some(&[json!("txid")]), None, None)
        .expect_err("not an object");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);

    let negative = json!({"txid": prev(1).to_string(), "vout": -1, "scriptPubKey": "51"});
    let err = svc
        .sign_raw_transaction(&unsigned, Some(&[negative]), None, None)
        .expect_err("vout");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);
    assert_eq!(err.message, "vout must be positive");

    let untyped = json!({"txid": prev(1).to_string(), "vout": "0", "scriptPubKey": "51"});
    let err = svc
        .sign_raw_transaction(&unsigned, Some(&[untyped]), None, None)
        .expect_err("vout type");
    assert_eq!(err.code, RpcErrorCode::TypeError);
}

#[test]
fn test_sign_rejects_conflicting_prevout() {
    let node = Arc::new(MemoryNode::default());
    node.coins.lock().insert(
        OutPoint::new(prev(1), 0),
        Coin {
            locking_script: pkh(&key(1)),
            amount: 5,
        },
    );
    let svc = service(&node);
    let unsigned = svc
        .create_raw_transaction(&[input(1, 0)], &pay(address(&svc, &key(2)), json!(0.1)), None)
        .expect("create");

    let err = svc
        .sign_raw_transaction(&unsigned, Some(&[prevtx(1, 0, &pkh(&key(9)), 0.0)]), None, None)
        .expect_err("mismatch");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);
    assert!(err.message.starts_with("Previous output scriptPubKey mismatch:"));
}

// -----------------------------------------------------------------------
// gettxoutproof / verifytxoutproof
// -----------------------------------------------------------------------

#[test]
fn test_proof_round_trip() {
    let node = Arc::new(MemoryNode::default());
    let block = block_with(6, 1);
    let hash = node.add_block(3, block.clone(), true);
    let svc = service(&node);

    let txids = block.txids();
    let wanted = vec![txids[4].to_string(), txids[1].to_string()];
    let proof = svc.get_tx_out_proof(&wanted, None).expect("proof");
    let by_hash = svc
        .get_tx_out_proof(&wanted, Some(&hash.to_string()))
        .expect("proof by hash");
    assert_eq!(proof, by_hash);

    let verified = svc.verify_tx_out_proof(&proof).expect("verify");
    assert_eq!(verified, vec![txids[1].to_string(), txids[4].to_string()]);
}

#[test]
fn test_proof_errors() {
    let node = Arc::new(MemoryNode::default());
    let block = block_with(3, 1);
    let hash = node.add_block(1, block.clone(), false);
    let svc = service(&node);
    let id = block.txids()[0].to_string();

    let err = svc
        .get_tx_out_proof(&[id.clone(), id.clone()], None)
        .expect_err("duplicate");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);

    let err = svc
        .get_tx_out_proof(&[id.clone()], Some(&prev(9).to_string()))
        .expect_err("unknown block");
    assert_eq!(err.code, RpcErrorCode::InvalidAddressOrKey);
    assert_eq!(err.message, "Block not found");

    let err = svc
        .get_tx_out_proof(&[prev(8).to_string()], None)
        .expect_err("loose");
    assert_eq!(err.message, "Transaction not yet in block");

    let err = svc
        .get_tx_out_proof(&[id.clone(), prev(8).to_string()], Some(&hash.to_string()))
        .expect_err("partial");
    assert_eq!(err.message, "(Not all) transactions not found in specified block");

    let proof = svc.get_tx_out_proof(&[id], None).expect("proof");
    let err = svc.verify_tx_out_proof(&proof).expect_err("stale block");
    assert_eq!(err.code, RpcErrorCode::InvalidAddressOrKey);
    assert_eq!(err.message, "Block not found in chain");

    let err = svc.verify_tx_out_proof("zz").expect_err("hex");
    assert_eq!(err.code, RpcErrorCode::InvalidParameter);

    let err = svc.verify_tx_out_proof(&proof[..proof.len() - 2]).expect_err("truncated");
    assert_eq!(err.code, RpcErrorCode::DeserializationError);
}

// -----------------------------------------------------------------------
// getrawtransaction
// -----------------------------------------------------------------------

#[test]
fn test_get_raw_transaction() {
    let node = Arc::new(MemoryNode::default());
    let block = block_with(2, 4);
    let hash = node.add_block(5, block.clone(), true);
    *node.tip.lock() = 7;
    let svc = service(&node);
    let tx = &block.transactions[1];

    let plain = svc.get_raw_transaction(&tx.tx_id().to_string(), false).expect("hex");
    assert_eq!(plain, RawTransaction::Hex(tx.to_hex()));

    let verbose = svc.get_raw_transaction(&tx.tx_id().to_string(), true).expect("verbose");
    let value = serde_json::to_value(&verbose).expect("json");
    assert_eq!(value["hex"], json!(tx.to_hex()));
    assert_eq!(value["txid"], json!(tx.tx_id().to_string()));
    assert_eq!(value["blockhash"], json!(hash.to_string()));
    assert_eq!(value["height"], json!(5));
    assert_eq!(value["confirmations"], json!(3));
    assert_eq!(value["time"], json!(1_600_000_004u32));
    assert_eq!(value["blocktime"], json!(1_600_000_004u32));
}

#[test]
fn test_get_raw_transaction_outside_active_chain() {
    let node = Arc::new(MemoryNode::default());
    let stale = block_with(1, 5);
    node.add_block(2, stale.clone(), false);

    let mut pooled = Transaction::new();
    pooled.lock_time = 77;
    node.index.lock().insert(
        pooled.tx_id(),
        IndexedTransaction {
            transaction: pooled.clone(),
            block_hash: None,
        },
    );
    let svc = service(&node);

    let value = serde_json::to_value(
        svc.get_raw_transaction(&stale.transactions[0].tx_id().to_string(), true)
            .expect("stale"),
    )
    .expect("json");
    assert_eq!(value["height"], json!(-1));
    assert_eq!(value["confirmations"], json!(0));
    assert!(value.get("time").is_none());

    let value = serde_json::to_value(
        svc.get_raw_transaction(&pooled.tx_id().to_string(), true)
            .expect("pooled"),
    )
    .expect("json");
    assert!(value.get("blockhash").is_none());
    assert!(value.get("confirmations").is_none());

    let err = svc
        .get_raw_transaction(&prev(1).to_string(), false)
        .expect_err("unknown");
    assert_eq!(err.code, RpcErrorCode::InvalidAddressOrKey);
    assert_eq!(err.message, "No information available about transaction");
}
