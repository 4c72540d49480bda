//! Partial merkle trees.
//!
//! A partial tree proves that some leaves belong to a merkle tree while
//! carrying only the hashes needed to rebuild its root. It is a
//! depth-first, left-to-right walk of the full tree with one flag bit per
//! visited node:
//!
//! - bit 1 on an inner node: some leaf below it matched; descend.
//! - bit 0 on an inner node: nothing below matched; its hash follows.
//! - on a leaf: the leaf hash follows, and bit 1 marks it as matched.
//!
//! A node whose right child would fall past the last leaf is paired with
//! itself, as in the full tree.
//!
//! Wire format: `u32 total ‖ varint n ‖ n × hash ‖ varint m ‖ m flag bytes`,
//! flag bits packed least significant first.

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::util::{VarInt, WireReader, WireWriter};

use crate::error::SpvError;
use crate::merkle_tree_parent::merkle_tree_parent;

/// Largest transaction count a proof may claim: a 1 MB block of
/// 60-byte transactions.
pub const MAX_PROOF_TRANSACTIONS: u32 = 1_000_000 / 60;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialMerkleTree {
    total: u32,
    hashes: Vec<Hash>,
    bits: Vec<bool>,
}

/// What a partial tree proves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matches {
    /// Root implied by the carried hashes.
    pub root: Hash,
    /// Matched leaves in tree order.
    pub txids: Vec<Hash>,
    /// Leaf position of each matched leaf.
    pub positions: Vec<u32>,
}

struct Cursor {
    bits_used: usize,
    hashes_used: usize,
}

impl PartialMerkleTree {
    /// Build the partial tree over `txids` revealing the leaves whose
    /// `matched` flag is set. Missing flags count as unmatched.
    pub fn new(txids: &[Hash], matched: &[bool]) -> Self {
        let mut tree = PartialMerkleTree {
            total: txids.len() as u32,
            hashes: Vec::new(),
            bits: Vec::new(),
        };
        if txids.is_empty() {
            return tree;
        }
        let height = tree.height();
        tree.traverse_and_build(height, 0, txids, matched);
        tree
    }

    pub fn total_transactions(&self) -> u32 {
        self.total
    }

    pub fn hashes(&self) -> &[Hash] {
        &self.hashes
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of nodes at `height`, leaves being height 0.
    fn width(&self, height: u32) -> u64 {
        (u64::from(self.total) + (1u64 << height) - 1) >> height
    }

    fn height(&self) -> u32 {
        let mut height = 0;
        while self.width(height) > 1 {
            height += 1;
        }
        height
    }

    fn calc_hash(&self, height: u32, pos: u64, txids: &[Hash]) -> Hash {
        if height == 0 {
            return txids[pos as usize];
        }
        let left = self.calc_hash(height - 1, pos * 2, txids);
        let right = if pos * 2 + 1 < self.width(height - 1) {
            self.calc_hash(height - 1, pos * 2 + 1, txids)
        } else {
            left
        };
        merkle_tree_parent(&left, &right)
    }

    fn traverse_and_build(&mut self, height: u32, pos: u64, txids: &[Hash], matched: &[bool]) {
        let first = pos << height;
        let end = ((pos + 1) << height).min(u64::from(self.total));
        let parent_of_match = (first..end).any(|p| matched.get(p as usize).copied().unwrap_or(false));
        self.bits.push(parent_of_match);

        if height == 0 || !parent_of_match {
            let hash = self.calc_hash(height, pos, txids);
            self.hashes.push(hash);
        } else {
            self.traverse_and_build(height - 1, pos * 2, txids, matched);
            if pos * 2 + 1 < self.width(height - 1) {
                self.traverse_and_build(height - 1, pos * 2 + 1, txids, matched);
            }
        }
    }

    fn traverse_and_extract(
        &self,
        height: u32,
        pos: u64,
        cursor: &mut Cursor,
        txids: &mut Vec<Hash>,
        positions: &mut Vec<u32>,
    ) -> Result<Hash, SpvError> {
        let parent_of_match = *self
            .bits
            .get(cursor.bits_used)
            .ok_or(SpvError::MalformedProof("ran out of flag bits"))?;
        cursor.bits_used += 1;

        if height == 0 || !parent_of_match {
            let hash = *self
                .hashes
                .get(cursor.hashes_used)
                .ok_or(SpvError::MalformedProof("ran out of hashes"))?;
            cursor.hashes_used += 1;
            if height == 0 && parent_of_match {
                txids.push(hash);
                positions.push(pos as u32);
            }
            return Ok(hash);
        }

        let left = self.traverse_and_extract(height - 1, pos * 2, cursor, txids, positions)?;
        let right = if pos * 2 + 1 < self.width(height - 1) {
            let right = self.traverse_and_extract(height - 1, pos * 2 + 1, cursor, txids, positions)?;
            if right == left {
                return Err(SpvError::MalformedProof("identical left and right siblings"));
            }
            right
        } else {
            left
        };
        Ok(merkle_tree_parent(&left, &right))
    }

    /// Walk the tree, returning the implied root and the matched leaves.
    ///
    /// Structural defects are errors: no transactions, an implausibly
    /// large count, more hashes than transactions, fewer flag bits than
    /// hashes, identical siblings, and hashes or flag bytes left unused.
    /// Whether the root is the right one is for the caller to check.
    pub fn extract_matches(&self) -> Result<Matches, SpvError> {
        if self.total == 0 {
            return Err(SpvError::MalformedProof("no transactions"));
        }
        if self.total > MAX_PROOF_TRANSACTIONS {
            return Err(SpvError::MalformedProof("too many transactions"));
        }
        if self.hashes.len() > self.total as usize {
            return Err(SpvError::MalformedProof("more hashes than transactions"));
        }
        if self.bits.len() < self.hashes.len() {
            return Err(SpvError::MalformedProof("fewer flag bits than hashes"));
        }

        let mut cursor = Cursor {
            bits_used: 0,
            hashes_used: 0,
        };
        let mut txids = Vec::new();
        let mut positions = Vec::new();
        let root = self.traverse_and_extract(self.height(), 0, &mut cursor, &mut txids, &mut positions)?;

        if (cursor.bits_used + 7) / 8 != (self.bits.len() + 7) / 8 {
            return Err(SpvError::MalformedProof("unused flag bytes"));
        }
        if cursor.hashes_used != self.hashes.len() {
            return Err(SpvError::MalformedProof("unused hashes"));
        }
        Ok(Matches {
            root,
            txids,
            positions,
        })
    }

    pub fn read_from(reader: &mut WireReader) -> Result<Self, SpvError> {
        let total = reader
            .read_u32_le()
            .map_err(|e| SpvError::reading("transaction count", e))?;
        let hash_count = reader
            .read_count()
            .map_err(|e| SpvError::reading("hash count", e))?;
        let mut hashes = Vec::with_capacity(hash_count);
        for _ in 0..hash_count {
            hashes.push(reader.read_hash().map_err(|e| SpvError::reading("hash", e))?);
        }
        let flag_bytes = reader
            .read_var_bytes()
            .map_err(|e| SpvError::reading("flag bytes", e))?;
        let bits = flag_bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |i| byte & (1 << i) != 0))
            .collect();
        Ok(PartialMerkleTree { total, hashes, bits })
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_u32_le(self.total);
        writer.write_varint(VarInt(self.hashes.len() as u64));
        for hash in &self.hashes {
            writer.write_hash(hash);
        }
        let mut flag_bytes = vec![0u8; (self.bits.len() + 7) / 8];
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                flag_bytes[i / 8] |= 1 << (i % 8);
            }
        }
        writer.write_var_bytes(&flag_bytes);
    }
}
