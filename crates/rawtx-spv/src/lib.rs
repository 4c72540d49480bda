//! Transaction inclusion proofs.
//!
//! Provides block headers and blocks, partial merkle trees, merkle-block
//! proofs, and the build/verify operations over the node's block index
//! and active chain.

pub mod block;
pub mod block_source;
pub mod chain_tracker;
pub mod error;
pub mod merkle_block;
pub mod merkle_tree_parent;
pub mod partial_merkle_tree;
pub mod proof;

pub use block::{Block, BlockHeader, BLOCK_HEADER_SIZE};
pub use block_source::{BlockRef, BlockSource};
pub use chain_tracker::ChainTracker;
pub use error::SpvError;
pub use merkle_block::MerkleBlock;
pub use merkle_tree_parent::{compute_merkle_root, merkle_tree_parent};
pub use partial_merkle_tree::{Matches, PartialMerkleTree, MAX_PROOF_TRANSACTIONS};
pub use proof::{build_proof, parse_txids, verify_proof};
