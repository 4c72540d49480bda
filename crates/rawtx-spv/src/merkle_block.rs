//! Merkle blocks: a block header plus a partial merkle tree over its
//! transactions. This is the serialized inclusion proof.

use std::collections::HashSet;

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::util::{WireReader, WireWriter};

use crate::block::{Block, BlockHeader};
use crate::error::SpvError;
use crate::partial_merkle_tree::{Matches, PartialMerkleTree};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleBlock {
    pub header: BlockHeader,
    pub tree: PartialMerkleTree,
}

impl MerkleBlock {
    /// Proof that the transactions of `block` whose identifiers are in
    /// `txids` belong to it.
    pub fn from_block(block: &Block, txids: &HashSet<Hash>) -> Self {
        let leaves = block.txids();
        let matched: Vec<bool> = leaves.iter().map(|id| txids.contains(id)).collect();
        MerkleBlock {
            header: block.header,
            tree: PartialMerkleTree::new(&leaves, &matched),
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SpvError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Decode a proof; bytes after the tree are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        let mut reader = WireReader::new(bytes);
        let header = BlockHeader::read_from(&mut reader)?;
        let tree = PartialMerkleTree::read_from(&mut reader)?;
        Ok(MerkleBlock { header, tree })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.header.write_to(&mut writer);
        self.tree.write_to(&mut writer);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Matched identifiers, when the tree's implied root is the header's
    /// merkle root. A well-formed tree with another root proves nothing
    /// and yields `None`.
    pub fn verified_matches(&self) -> Result<Option<Matches>, SpvError> {
        let matches = self.tree.extract_matches()?;
        if matches.root != self.header.merkle_root {
            tracing::debug!(
                implied = %matches.root,
                declared = %self.header.merkle_root,
                "proof root does not match header"
            );
            return Ok(None);
        }
        Ok(Some(matches))
    }
}
