//! Active-chain membership.

use rawtx_primitives::chainhash::Hash;

use crate::error::SpvError;

/// View of the node's active chain.
///
/// A proof is only trusted once its header is known to be part of the
/// chain the node currently follows.
pub trait ChainTracker {
    /// Whether the block with `block_hash` is on the active chain.
    fn is_in_active_chain(&self, block_hash: &Hash) -> Result<bool, SpvError>;

    /// Height of the active chain tip.
    fn current_height(&self) -> Result<u32, SpvError>;
}
