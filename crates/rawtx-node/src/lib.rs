//! Node-facing raw transaction service.
//!
//! Ties the codec, builder, signer and proof engine to a node's shared
//! state: the broadcast gateway, the coarse state lock, configuration,
//! logging and the RPC-shaped [`RawTransactionService`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod service;
pub mod state;

pub use config::{LoggingConfig, NodeConfig, DEFAULT_MAX_TX_FEE};
pub use error::{ConfigError, GatewayError, RpcError, RpcErrorCode};
pub use gateway::{AdmissionPolicy, BroadcastGateway, LedgerView, MempoolView, Rejection, Relay};
pub use logging::{init_logging, try_init_logging, LogFormat};
pub use service::{
    BlockPlacement, IndexedTransaction, NodeBackend, RawTransaction, RawTransactionService,
    TransactionIndex, VerboseTransaction,
};
pub use state::StateLock;

#[cfg(test)]
mod tests;
