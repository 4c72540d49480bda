//! Block lookup and storage access.

use rawtx_primitives::chainhash::Hash;

use crate::block::Block;
use crate::error::SpvError;

/// A block known to the node's block index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub hash: Hash,
    pub height: u32,
    /// Header timestamp.
    pub time: u32,
}

/// The node's block index and block storage.
pub trait BlockSource {
    /// Index entry for `block_hash`, or `None` when the block is unknown.
    fn lookup_block(&self, block_hash: &Hash) -> Option<BlockRef>;

    /// Block anchoring `txid`, found through the unspent-output set or the
    /// transaction index. `None` when the transaction is not in a block.
    fn lookup_block_by_anchor(&self, txid: &Hash) -> Option<BlockRef>;

    /// Read a whole block from storage.
    fn read_block(&self, block: &BlockRef) -> Result<Block, SpvError>;
}
