//! Error types for the node facade and the numeric codes its callers see.

use std::fmt;

use rawtx_sign::SignError;
use rawtx_spv::SpvError;
use rawtx_transaction::TransactionError;
use serde::{Serialize, Serializer};

/// Numeric error codes of the node's RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RpcErrorCode {
    /// A value has the wrong type or is not a valid amount.
    TypeError = -3,
    /// Unknown address, key, block or transaction.
    InvalidAddressOrKey = -5,
    /// A parameter is out of range, duplicated or malformed.
    InvalidParameter = -8,
    /// Bytes that do not decode.
    DeserializationError = -22,
    /// Submission failed for a reason other than policy rejection.
    TransactionError = -25,
    /// The admission policy rejected the transaction.
    TransactionRejected = -26,
    TransactionAlreadyInChain = -27,
    InternalError = -32603,
}

impl RpcErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Serialize for RpcErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

/// A failed call: code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParameter, message)
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::DeserializationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }
}

/// Why the broadcast gateway refused a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("TX decode failed")]
    Decode,

    /// Policy rejection with the policy's own code and reason.
    #[error("{code}: {reason}")]
    Rejected { code: u32, reason: String },

    #[error("Missing inputs")]
    MissingInputs,

    /// Any other admission failure, carrying the policy's reason.
    #[error("{0}")]
    Other(String),

    #[error("transaction already in block chain")]
    AlreadyInChain,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<GatewayError> for RpcError {
    fn from(e: GatewayError) -> Self {
        let code = match e {
            GatewayError::Decode => RpcErrorCode::DeserializationError,
            GatewayError::Rejected { .. } => RpcErrorCode::TransactionRejected,
            GatewayError::MissingInputs | GatewayError::Other(_) => RpcErrorCode::TransactionError,
            GatewayError::AlreadyInChain => RpcErrorCode::TransactionAlreadyInChain,
        };
        RpcError::new(code, e.to_string())
    }
}

impl From<TransactionError> for RpcError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::Decode(_) => RpcError::deserialization("TX decode failed"),
            TransactionError::InvalidTransaction(_) => RpcError::deserialization(e.to_string()),
            TransactionError::InvalidParameter(message) => RpcError::invalid_parameter(message),
            TransactionError::InvalidAddress(_) => {
                RpcError::new(RpcErrorCode::InvalidAddressOrKey, e.to_string())
            }
            TransactionError::InvalidAmount | TransactionError::AmountOutOfRange => {
                RpcError::new(RpcErrorCode::TypeError, e.to_string())
            }
            TransactionError::InvalidSighash
            | TransactionError::Script(_)
            | TransactionError::Primitives(_) => RpcError::invalid_parameter(e.to_string()),
        }
    }
}

impl From<SignError> for RpcError {
    fn from(e: SignError) -> Self {
        match e {
            SignError::MissingTransaction
            | SignError::InvalidPrevout(_)
            | SignError::PrevoutMismatch { .. } => RpcError::deserialization(e.to_string()),
            SignError::InvalidPrivateKey => {
                RpcError::new(RpcErrorCode::InvalidAddressOrKey, e.to_string())
            }
            SignError::Transaction(inner) => inner.into(),
            SignError::Script(_) | SignError::Primitives(_) => {
                RpcError::invalid_parameter(e.to_string())
            }
        }
    }
}

impl From<SpvError> for RpcError {
    fn from(e: SpvError) -> Self {
        if let SpvError::Hex(_) = e {
            return RpcError::invalid_parameter("proof must be hexadecimal string");
        }
        let code = match e {
            SpvError::InvalidTxid(_) | SpvError::DuplicateTxid(_) | SpvError::Hex(_) => {
                RpcErrorCode::InvalidParameter
            }
            SpvError::BlockNotFound
            | SpvError::NotInBlock
            | SpvError::TxidsNotInBlock
            | SpvError::BlockNotInChain => RpcErrorCode::InvalidAddressOrKey,
            SpvError::BlockUnreadable => RpcErrorCode::InternalError,
            SpvError::MalformedProof(_)
            | SpvError::Decode(_)
            | SpvError::Transaction(_)
            | SpvError::Primitives(_) => RpcErrorCode::DeserializationError,
        };
        RpcError::new(code, e.to_string())
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::internal(e.to_string())
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
