//! Merkle tree node hashing.

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::hash::sha256d;

/// Parent of two nodes: double SHA-256 of the concatenated internal bytes.
pub fn merkle_tree_parent(left: &Hash, right: &Hash) -> Hash {
    let mut concatenated = [0u8; 64];
    concatenated[..32].copy_from_slice(left.as_bytes());
    concatenated[32..].copy_from_slice(right.as_bytes());
    Hash::new(sha256d(&concatenated))
}

/// Root of the binary tree over `leaves`, pairing a lone last node at any
/// level with itself. The root of no leaves is the zero hash.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| merkle_tree_parent(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
    }
    level.first().copied().unwrap_or_default()
}
