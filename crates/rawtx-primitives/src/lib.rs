/// Cryptographic primitives and wire encoding for raw transaction handling.
///
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type for transaction ids, block hashes and merkle nodes
/// - Compact-size integers and little-endian readers/writers
/// - secp256k1 keys and ECDSA signatures with WIF import

pub mod chainhash;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
