//! Transaction input referencing a previous output.
//!
//! Carries the outpoint being spent, the unlocking script, the sequence
//! number and the input's witness stack. The witness is serialized
//! separately by the transaction codec; `read_from`/`write_to` handle only
//! the base fields.

use std::fmt;

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::util::{WireReader, WireWriter};
use rawtx_script::Script;

use crate::TransactionError;

/// Sequence number marking a finalized input (no lock-time consideration).
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Reference to one output of a prior transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, index: u32) -> Self {
        OutPoint { txid, index }
    }

    /// The outpoint a coinbase input spends: zero hash, index `0xFFFFFFFF`.
    pub fn null() -> Self {
        OutPoint {
            txid: Hash::default(),
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.index == u32::MAX
    }

    pub(crate) fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let txid = reader
            .read_hash()
            .map_err(|e| TransactionError::reading("previous txid", e))?;
        let index = reader
            .read_u32_le()
            .map_err(|e| TransactionError::reading("previous output index", e))?;
        Ok(OutPoint { txid, index })
    }

    pub(crate) fn write_to(&self, writer: &mut WireWriter) {
        writer.write_hash(&self.txid);
        writer.write_u32_le(self.index);
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A single transaction input.
///
/// # Wire format (base fields)
///
/// | Field            | Size          |
/// |------------------|---------------|
/// | previous txid    | 32 bytes      |
/// | previous index   | 4 bytes (LE)  |
/// | script length    | VarInt        |
/// | unlocking_script | variable      |
/// | sequence_number  | 4 bytes (LE)  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_output: OutPoint,

    /// The unlocking script (scriptSig); empty while unsigned.
    pub unlocking_script: Script,

    pub sequence_number: u32,

    /// Witness stack items; empty for inputs without witness data.
    pub witness: Vec<Vec<u8>>,
}

impl TransactionInput {
    /// Create an unsigned input spending `previous_output`.
    pub fn new(previous_output: OutPoint, sequence_number: u32) -> Self {
        TransactionInput {
            previous_output,
            unlocking_script: Script::new(),
            sequence_number,
            witness: Vec::new(),
        }
    }

    /// Deserialize the base fields of an input; the witness is left empty.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let previous_output = OutPoint::read_from(reader)?;
        let script_bytes = reader
            .read_var_bytes()
            .map_err(|e| TransactionError::reading("unlocking script", e))?;
        let sequence_number = reader
            .read_u32_le()
            .map_err(|e| TransactionError::reading("sequence number", e))?;

        Ok(TransactionInput {
            previous_output,
            unlocking_script: Script::from_bytes(script_bytes),
            sequence_number,
            witness: Vec::new(),
        })
    }

    /// Serialize the base fields of this input.
    pub fn write_to(&self, writer: &mut WireWriter) {
        self.previous_output.write_to(writer);
        writer.write_var_bytes(self.unlocking_script.as_bytes());
        writer.write_u32_le(self.sequence_number);
    }

    pub(crate) fn read_witness(&mut self, reader: &mut WireReader) -> Result<(), TransactionError> {
        let count = reader
            .read_count()
            .map_err(|e| TransactionError::reading("witness item count", e))?;
        let mut stack = Vec::with_capacity(count);
        for _ in 0..count {
            let item = reader
                .read_var_bytes()
                .map_err(|e| TransactionError::reading("witness item", e))?;
            stack.push(item.to_vec());
        }
        self.witness = stack;
        Ok(())
    }

    pub(crate) fn write_witness(&self, writer: &mut WireWriter) {
        writer.write_varint(self.witness.len().into());
        for item in &self.witness {
            writer.write_var_bytes(item);
        }
    }

    pub fn has_witness(&self) -> bool {
        !self.witness.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpoint_null() {
        assert!(OutPoint::null().is_null());
        assert!(!OutPoint::new(Hash::default(), 0).is_null());
        assert!(!OutPoint::default().is_null());
    }

    #[test]
    fn test_input_base_round_trip() {
        let mut input = TransactionInput::new(OutPoint::new(Hash::new([7; 32]), 3), 0xFFFF_FFFE);
        input.unlocking_script = Script::from_bytes(&[0x51, 0x52]);
        input.witness = vec![vec![1, 2, 3]];

        let mut writer = WireWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 32 + 4 + 1 + 2 + 4);

        let mut reader = WireReader::new(&bytes);
        let decoded = TransactionInput::read_from(&mut reader).expect("decode");
        assert!(reader.is_empty());
        assert_eq!(decoded.previous_output, input.previous_output);
        assert_eq!(decoded.unlocking_script, input.unlocking_script);
        assert_eq!(decoded.sequence_number, 0xFFFF_FFFE);
        assert!(decoded.witness.is_empty(), "base encoding carries no witness");
    }

    #[test]
    fn test_truncated_input() {
        let bytes = [0u8; 35];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            TransactionInput::read_from(&mut reader),
            Err(TransactionError::Decode(_))
        ));
    }
}
