/// Transaction handling: wire codec, signature hashing and construction.
///
/// Provides the Transaction type with legacy and witness encodings,
/// legacy and BIP-143 signature hashes, decimal amounts, the unsigned
/// transaction builder and decoded JSON projections.

pub mod amount;
pub mod builder;
pub mod input;
pub mod output;
pub mod projection;
pub mod sighash;
pub mod transaction;

mod error;
pub use builder::{build_raw_transaction, InputRef, OutputIntent};
pub use error::TransactionError;
pub use input::{OutPoint, TransactionInput, SEQUENCE_FINAL};
pub use output::TransactionOutput;
pub use sighash::SigVersion;
pub use transaction::Transaction;
