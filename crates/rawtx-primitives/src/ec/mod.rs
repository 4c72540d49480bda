/// secp256k1 keys and ECDSA signatures.
///
/// Private keys carry the public-key compression flag they were imported
/// with, so signing templates push the same key encoding the owner's
/// addresses were derived from.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
