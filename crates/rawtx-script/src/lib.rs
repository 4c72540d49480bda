/// Script handling for raw transactions.
///
/// Provides the Script type, opcode definitions, chunk parsing, the
/// standard-template classifier and the address text codec.

pub mod address;
pub mod chunk;
pub mod opcodes;
pub mod script;
pub mod standard;

mod error;
pub use address::{AddressCodec, AddressParams, Network, StandardAddressCodec};
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
pub use standard::{classify, solve, Classification, Destination, ScriptTemplate, ScriptType};
