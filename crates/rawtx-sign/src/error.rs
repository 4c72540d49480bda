/// Error type for signing requests.
///
/// Only failures that abort a whole request live here. Per-input
/// resolution and verification failures are reported inside the
/// signing result instead.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// No transaction variants were supplied.
    #[error("Missing transaction")]
    MissingTransaction,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// A prior-output descriptor is malformed.
    #[error("{0}")]
    InvalidPrevout(String),

    /// A descriptor names a visible coin with a different locking script.
    #[error("Previous output scriptPubKey mismatch:\n{existing}\nvs:\n{given}")]
    PrevoutMismatch { existing: String, given: String },

    #[error("transaction error: {0}")]
    Transaction(#[from] rawtx_transaction::TransactionError),

    #[error("script error: {0}")]
    Script(#[from] rawtx_script::ScriptError),

    #[error("primitives error: {0}")]
    Primitives(#[from] rawtx_primitives::PrimitivesError),
}
