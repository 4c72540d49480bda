#![deny(missing_docs)]

//! Raw transaction toolkit.
//!
//! Re-exports the codec, builder, signer, proof engine and node service
//! crates for single-crate usage.

pub use rawtx_node as node;
pub use rawtx_primitives as primitives;
pub use rawtx_script as script;
pub use rawtx_sign as sign;
pub use rawtx_spv as spv;
pub use rawtx_transaction as transaction;
