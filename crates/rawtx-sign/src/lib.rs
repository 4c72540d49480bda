/// Signing for raw transactions.
///
/// Resolves prior outputs through a request-scoped coin overlay, produces
/// signatures for the standard templates, merges partial signatures from
/// several copies of one transaction and verifies every input.

pub mod checker;
pub mod coins;
pub mod combine;
pub mod keystore;
pub mod producer;
pub mod sigdata;
pub mod signer;
pub mod verifier;

mod error;
pub use checker::{SignatureChecker, TransactionSignatureChecker};
pub use coins::{Coin, CoinView, CoinsOverlay};
pub use combine::combine_signatures;
pub use error::SignError;
pub use keystore::{KeyStore, SigningProvider};
pub use sigdata::SignatureData;
pub use signer::{seed_prevouts, sign_variants, InputError, PrevOutput, SignOutcome, SignResult};
pub use verifier::{ScriptFailure, ScriptVerifier, StandardScriptVerifier};
