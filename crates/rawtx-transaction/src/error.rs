/// Error types for transaction decoding, hashing and construction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Malformed or truncated wire bytes; never partially accepted.
    #[error("decode error: {0}")]
    Decode(String),

    /// The transaction structure does not support the requested operation.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A caller-supplied parameter is out of range or duplicated.
    #[error("{0}")]
    InvalidParameter(String),

    /// Address text that the codec does not accept.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Amount out of range")]
    AmountOutOfRange,

    #[error("Invalid sighash param")]
    InvalidSighash,

    #[error("script error: {0}")]
    Script(#[from] rawtx_script::ScriptError),

    #[error("primitives error: {0}")]
    Primitives(#[from] rawtx_primitives::PrimitivesError),
}

impl TransactionError {
    /// Wrap a lower-level read failure with the field being read.
    pub(crate) fn reading(field: &str, e: impl std::fmt::Display) -> Self {
        TransactionError::Decode(format!("reading {}: {}", field, e))
    }
}
