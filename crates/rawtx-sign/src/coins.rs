//! Coin resolution for a single signing request.
//!
//! The shared UTXO/mempool view is read once, up front, into a
//! `CoinsOverlay`. Prior-output descriptors supplied with the request are
//! then written into the overlay only. The overlay is owned by the
//! request and dropped with it.

use std::collections::HashMap;

use rawtx_script::Script;
use rawtx_transaction::OutPoint;

use crate::SignError;

/// An unspent output: what it pays to and how much.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub locking_script: Script,
    pub amount: u64,
}

/// Read access to unspent outputs, as seen by the ledger and mempool.
pub trait CoinView {
    /// The coin at `outpoint`, or `None` when it does not exist or is spent.
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}

/// Request-scoped coin set: a snapshot of the shared view plus any coins
/// the caller described.
#[derive(Clone, Debug, Default)]
pub struct CoinsOverlay {
    coins: HashMap<OutPoint, Coin>,
}

impl CoinsOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the coins for `outpoints` out of `view`. Missing or spent
    /// coins are simply absent from the snapshot.
    pub fn snapshot<'a, I>(view: &dyn CoinView, outpoints: I) -> Self
    where
        I: IntoIterator<Item = &'a OutPoint>,
    {
        let mut coins = HashMap::new();
        for outpoint in outpoints {
            if coins.contains_key(outpoint) {
                continue;
            }
            if let Some(coin) = view.coin(outpoint) {
                coins.insert(*outpoint, coin);
            }
        }
        CoinsOverlay { coins }
    }

    /// Add a caller-described coin.
    ///
    /// A coin already visible at `outpoint` with a different locking
    /// script is a conflict and rejects the request; with the same script,
    /// the described amount replaces the visible one.
    pub fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) -> Result<(), SignError> {
        if let Some(existing) = self.coins.get(&outpoint) {
            if existing.locking_script != coin.locking_script {
                return Err(SignError::PrevoutMismatch {
                    existing: existing.locking_script.to_asm(),
                    given: coin.locking_script.to_asm(),
                });
            }
        }
        self.coins.insert(outpoint, coin);
        Ok(())
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.coins.get(outpoint)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

impl CoinView for CoinsOverlay {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.get(outpoint).cloned()
    }
}
