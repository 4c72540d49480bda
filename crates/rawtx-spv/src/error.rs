/// Error type for inclusion proofs.
#[derive(Debug, thiserror::Error)]
pub enum SpvError {
    /// A requested identifier is not 64 hex characters.
    #[error("Invalid txid {0}")]
    InvalidTxid(String),

    #[error("Invalid parameter, duplicated txid: {0}")]
    DuplicateTxid(String),

    /// An explicitly named block is unknown.
    #[error("Block not found")]
    BlockNotFound,

    #[error("Transaction not yet in block")]
    NotInBlock,

    #[error("Can't read block from disk")]
    BlockUnreadable,

    #[error("(Not all) transactions not found in specified block")]
    TxidsNotInBlock,

    /// A proof's header is not on the active chain.
    #[error("Block not found in chain")]
    BlockNotInChain,

    /// A proof whose tree cannot be walked.
    #[error("invalid merkle proof: {0}")]
    MalformedProof(&'static str),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transaction error: {0}")]
    Transaction(#[from] rawtx_transaction::TransactionError),

    #[error("primitives error: {0}")]
    Primitives(#[from] rawtx_primitives::PrimitivesError),

    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl SpvError {
    pub(crate) fn reading(field: &str, e: impl std::fmt::Display) -> Self {
        SpvError::Decode(format!("reading {}: {}", field, e))
    }
}
