//! Broadcast gateway.
//!
//! Hands a raw transaction to the node's admission policy and relays it
//! to peers. The whole check-submit-relay sequence runs under the state
//! lock so mempool and chain membership cannot change halfway through.

use rawtx_primitives::chainhash::Hash;
use rawtx_transaction::Transaction;

use crate::error::GatewayError;
use crate::state::StateLock;

/// The node's memory pool.
pub trait MempoolView {
    fn contains(&self, txid: &Hash) -> bool;
}

/// The node's view of the active chain.
pub trait LedgerView {
    /// True when the transaction is confirmed on the active chain and
    /// still has unspent outputs.
    fn is_confirmed(&self, txid: &Hash) -> bool;
}

/// Why the admission policy refused a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Invalid under policy or consensus, with the reject code and reason.
    Invalid { code: u32, reason: String },
    /// Spends outputs the node does not know.
    MissingInputs,
    /// Any other failure.
    Failed(String),
}

/// Memory pool admission.
pub trait AdmissionPolicy {
    /// Accept `tx` into the pool. `fee_cap` is the highest absolute fee
    /// allowed; `None` means no cap.
    fn admit(&self, tx: &Transaction, fee_cap: Option<u64>) -> Result<(), Rejection>;
}

/// Announcement to peers.
pub trait Relay {
    fn relay(&self, tx: &Transaction);
}

/// Submission path for raw transactions.
pub struct BroadcastGateway<'a> {
    mempool: &'a dyn MempoolView,
    ledger: &'a dyn LedgerView,
    policy: &'a dyn AdmissionPolicy,
    relay: &'a dyn Relay,
    lock: &'a StateLock,
    max_tx_fee: u64,
}

impl<'a> BroadcastGateway<'a> {
    pub fn new(
        mempool: &'a dyn MempoolView,
        ledger: &'a dyn LedgerView,
        policy: &'a dyn AdmissionPolicy,
        relay: &'a dyn Relay,
        lock: &'a StateLock,
        max_tx_fee: u64,
    ) -> Self {
        BroadcastGateway {
            mempool,
            ledger,
            policy,
            relay,
            lock,
            max_tx_fee,
        }
    }

    /// Fee cap handed to the policy.
    pub fn fee_cap(&self, allow_high_fees: bool) -> Option<u64> {
        if allow_high_fees {
            None
        } else {
            Some(self.max_tx_fee)
        }
    }

    /// Decode and submit a hex-encoded transaction.
    pub fn send_hex(&self, tx_hex: &str, allow_high_fees: bool) -> Result<Hash, GatewayError> {
        let tx = Transaction::from_hex(tx_hex).map_err(|_| GatewayError::Decode)?;
        self.send(&tx, allow_high_fees)
    }

    /// Submit `tx` and relay it.
    ///
    /// A transaction already in the pool is not resubmitted but is relayed
    /// again. One already confirmed is an error.
    pub fn send(&self, tx: &Transaction, allow_high_fees: bool) -> Result<Hash, GatewayError> {
        let txid = tx.tx_id();
        let _guard = self.lock.lock();

        let in_mempool = self.mempool.contains(&txid);
        let in_chain = self.ledger.is_confirmed(&txid);

        if in_chain {
            tracing::warn!(%txid, "submitted transaction already confirmed");
            return Err(GatewayError::AlreadyInChain);
        }

        if !in_mempool {
            let fee_cap = self.fee_cap(allow_high_fees);
            self.policy.admit(tx, fee_cap).map_err(|rejection| {
                let err = match rejection {
                    Rejection::Invalid { code, reason } => GatewayError::Rejected { code, reason },
                    Rejection::MissingInputs => GatewayError::MissingInputs,
                    Rejection::Failed(reason) => GatewayError::Other(reason),
                };
                tracing::warn!(%txid, error = %err, "transaction rejected");
                err
            })?;
            tracing::info!(%txid, size = tx.size(), ?fee_cap, "transaction accepted");
        } else {
            tracing::debug!(%txid, "transaction already in mempool");
        }

        self.relay.relay(tx);
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use rawtx_script::Script;
    use rawtx_transaction::{OutPoint, TransactionInput, TransactionOutput};

    use super::*;

    #[derive(Default)]
    struct Node {
        mempool: RefCell<HashSet<Hash>>,
        chain: HashSet<Hash>,
        verdict: Option<Rejection>,
        caps: RefCell<Vec<Option<u64>>>,
        relayed: RefCell<Vec<Hash>>,
    }

    impl MempoolView for Node {
        fn contains(&self, txid: &Hash) -> bool {
            self.mempool.borrow().contains(txid)
        }
    }

    impl LedgerView for Node {
        fn is_confirmed(&self, txid: &Hash) -> bool {
            self.chain.contains(txid)
        }
    }

    impl AdmissionPolicy for Node {
        fn admit(&self, tx: &Transaction, fee_cap: Option<u64>) -> Result<(), Rejection> {
            self.caps.borrow_mut().push(fee_cap);
            match &self.verdict {
                Some(rejection) => Err(rejection.clone()),
                None => {
                    self.mempool.borrow_mut().insert(tx.tx_id());
                    Ok(())
                }
            }
        }
    }

    impl Relay for Node {
        fn relay(&self, tx: &Transaction) {
            self.relayed.borrow_mut().push(tx.tx_id());
        }
    }

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TransactionInput::new(OutPoint::new(Hash::new([3; 32]), 1), 0xFFFF_FFFF));
        tx.outputs.push(TransactionOutput::new(5_000, Script::from_bytes(&[0x51])));
        tx
    }

    fn gateway<'a>(node: &'a Node, lock: &'a StateLock) -> BroadcastGateway<'a> {
        BroadcastGateway::new(node, node, node, node, lock, 10_000_000)
    }

    #[test]
    fn test_accept_and_relay() {
        let node = Node::default();
        let lock = StateLock::new();
        let tx = sample_tx();
        let txid = gateway(&node, &lock).send_hex(&tx.to_hex(), false).expect("send");
        assert_eq!(txid, tx.tx_id());
        assert!(node.mempool.borrow().contains(&txid));
        assert_eq!(*node.relayed.borrow(), vec![txid]);
        assert_eq!(*node.caps.borrow(), vec![Some(10_000_000)]);
    }

    #[test]
    fn test_high_fees_lift_the_cap() {
        let node = Node::default();
        let lock = StateLock::new();
        gateway(&node, &lock).send(&sample_tx(), true).expect("send");
        assert_eq!(*node.caps.borrow(), vec![None]);
    }

    #[test]
    fn test_mempool_resident_is_relayed_again() {
        let node = Node::default();
        let tx = sample_tx();
        node.mempool.borrow_mut().insert(tx.tx_id());
        let lock = StateLock::new();

        let txid = gateway(&node, &lock).send(&tx, false).expect("no-op");
        assert_eq!(txid, tx.tx_id());
        assert!(node.caps.borrow().is_empty());
        assert_eq!(node.relayed.borrow().len(), 1);
    }

    #[test]
    fn test_confirmed_is_an_error() {
        let tx = sample_tx();
        let node = Node {
            chain: HashSet::from([tx.tx_id()]),
            ..Node::default()
        };
        let lock = StateLock::new();
        let err = gateway(&node, &lock).send(&tx, false).expect_err("known");
        assert_eq!(err, GatewayError::AlreadyInChain);
        assert!(node.relayed.borrow().is_empty());
    }

    #[test]
    fn test_rejections() {
        let lock = StateLock::new();
        let cases = [
            (
                Rejection::Invalid {
                    code: 16,
                    reason: "bad-txns-vout-negative".into(),
                },
                "16: bad-txns-vout-negative",
            ),
            (Rejection::MissingInputs, "Missing inputs"),
            (Rejection::Failed("absurdly-high-fee".into()), "absurdly-high-fee"),
        ];
        for (rejection, message) in cases {
            let node = Node {
                verdict: Some(rejection),
                ..Node::default()
            };
            let err = gateway(&node, &lock).send(&sample_tx(), false).expect_err("rejected");
            assert_eq!(err.to_string(), message);
            assert!(node.relayed.borrow().is_empty());
        }
    }

    #[test]
    fn test_undecodable_hex() {
        let node = Node::default();
        let lock = StateLock::new();
        let g = gateway(&node, &lock);
        assert_eq!(g.send_hex("zz", false), Err(GatewayError::Decode));
        assert_eq!(g.send_hex("0100", false), Err(GatewayError::Decode));
    }

    #[test]
    fn test_lock_is_reentrant_for_collaborators() {
        struct LockingRelay<'a>(&'a StateLock);
        impl Relay for LockingRelay<'_> {
            fn relay(&self, _tx: &Transaction) {
                let _again = self.0.lock();
            }
        }

        let node = Node::default();
        let lock = StateLock::new();
        let relay = LockingRelay(&lock);
        let g = BroadcastGateway::new(&node, &node, &node, &relay, &lock, 1);
        g.send(&sample_tx(), false).expect("send");
    }
}
