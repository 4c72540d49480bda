//! Building and checking transaction inclusion proofs.

use std::collections::HashSet;

use rawtx_primitives::chainhash::{Hash, HASH_HEX_LEN};

use crate::block_source::BlockSource;
use crate::chain_tracker::ChainTracker;
use crate::error::SpvError;
use crate::merkle_block::MerkleBlock;

/// Parse display-form identifiers into a set.
///
/// Each must be exactly 64 hex characters, and no identifier may repeat.
/// Also returns the last identifier given, which is the one used to find
/// the block when none is named.
pub fn parse_txids<S: AsRef<str>>(txids: &[S]) -> Result<(HashSet<Hash>, Option<Hash>), SpvError> {
    let mut set = HashSet::with_capacity(txids.len());
    let mut last = None;
    for txid in txids {
        let text = txid.as_ref();
        if text.len() != HASH_HEX_LEN {
            return Err(SpvError::InvalidTxid(text.to_string()));
        }
        let hash = Hash::from_hex_exact(text).map_err(|_| SpvError::InvalidTxid(text.to_string()))?;
        if !set.insert(hash) {
            return Err(SpvError::DuplicateTxid(text.to_string()));
        }
        last = Some(hash);
    }
    Ok((set, last))
}

/// Build a proof that every one of `txids` is in one block.
///
/// The block is `block_hash` when given, otherwise the block anchoring the
/// last identifier. Fails unless every identifier is in that block.
pub fn build_proof<S: AsRef<str>>(
    txids: &[S],
    block_hash: Option<&str>,
    source: &dyn BlockSource,
) -> Result<MerkleBlock, SpvError> {
    let (wanted, last) = parse_txids(txids)?;

    let block_ref = match block_hash {
        Some(text) => Hash::from_hex(text)
            .ok()
            .and_then(|hash| source.lookup_block(&hash))
            .ok_or(SpvError::BlockNotFound)?,
        None => last
            .and_then(|txid| source.lookup_block_by_anchor(&txid))
            .ok_or(SpvError::NotInBlock)?,
    };

    let block = source.read_block(&block_ref).map_err(|e| {
        tracing::warn!(block = %block_ref.hash, height = block_ref.height, error = %e, "block read failed");
        SpvError::BlockUnreadable
    })?;

    let found = block.txids().iter().filter(|id| wanted.contains(id)).count();
    if found != wanted.len() {
        return Err(SpvError::TxidsNotInBlock);
    }

    let proof = MerkleBlock::from_block(&block, &wanted);
    tracing::debug!(
        block = %block_ref.hash,
        transactions = block.transactions.len(),
        matched = found,
        hashes = proof.tree.hashes().len(),
        "built inclusion proof"
    );
    Ok(proof)
}

/// Check a hex-encoded proof and return the identifiers it commits to.
///
/// A proof whose tree implies some other root yields an empty list. A
/// proof that verifies but whose block is not on the active chain is an
/// error.
pub fn verify_proof(proof_hex: &str, chain: &dyn ChainTracker) -> Result<Vec<Hash>, SpvError> {
    let merkle_block = MerkleBlock::from_hex(proof_hex)?;
    let Some(matches) = merkle_block.verified_matches()? else {
        return Ok(Vec::new());
    };
    let block_hash = merkle_block.header.hash();
    if !chain.is_in_active_chain(&block_hash)? {
        return Err(SpvError::BlockNotInChain);
    }
    tracing::debug!(block = %block_hash, matched = matches.txids.len(), "verified inclusion proof");
    Ok(matches.txids)
}
