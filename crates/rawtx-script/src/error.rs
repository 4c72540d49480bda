/// Error type for script parsing, building and address handling.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// A token in an asm string is neither an opcode, a number nor hex.
    #[error("invalid opcode data")]
    InvalidOpcodeData,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A push claims more bytes than the script has left.
    #[error("not enough data")]
    DataTooSmall,

    #[error("data too big")]
    DataTooBig,

    #[error("script index out of range")]
    IndexOutOfRange,

    #[error("primitives error: {0}")]
    Primitives(#[from] rawtx_primitives::PrimitivesError),
}
