//! Core transaction type.
//!
//! Represents a transaction with version, inputs (each carrying its own
//! witness stack), outputs and lock time. Supports the legacy and the
//! witness-carrying wire encodings, identifier computation, size/weight
//! accounting and coinbase detection.

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::util::{WireReader, WireWriter};

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::TransactionError;

/// Marker byte that replaces the input count in the witness encoding.
const WITNESS_MARKER: u8 = 0x00;
/// The only defined witness flag bit.
const WITNESS_FLAG: u8 = 0x01;
/// Base bytes count four weight units, witness bytes count one.
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// A transaction.
///
/// # Wire format
///
/// | Field        | Size                           |
/// |--------------|--------------------------------|
/// | version      | 4 bytes (LE)                   |
/// | marker, flag | `0x00 0x01`, witness form only |
/// | input count  | VarInt                         |
/// | inputs       | variable (per input)           |
/// | output count | VarInt                         |
/// | outputs      | variable (per output)          |
/// | witnesses    | one stack per input, witness form only |
/// | lock_time    | 4 bytes (LE)                   |
///
/// The witness form is written only when at least one input has a
/// non-empty witness stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,

    /// Ordered list of transaction inputs.
    pub inputs: Vec<TransactionInput>,

    /// Ordered list of transaction outputs.
    pub outputs: Vec<TransactionOutput>,

    /// Lock time; 0 means unconstrained.
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Create a new empty transaction with version 1 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::Decode(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse exactly one transaction from raw bytes.
    ///
    /// The witness-aware grammar is tried first; if it fails or leaves
    /// bytes behind, the legacy grammar is tried. This decodes legacy
    /// transactions with zero inputs, whose empty input count would
    /// otherwise be read as the witness marker.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or a `Decode` error if neither grammar
    /// consumes the bytes exactly.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let witness_attempt = Self::decode_exact(bytes, Self::read_from);
        match witness_attempt {
            Ok(tx) => Ok(tx),
            Err(err) => Self::decode_exact(bytes, Self::read_legacy).map_err(|_| err),
        }
    }

    fn decode_exact(
        bytes: &[u8],
        read: fn(&mut WireReader) -> Result<Self, TransactionError>,
    ) -> Result<Self, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let tx = read(&mut reader)?;
        if !reader.is_empty() {
            return Err(TransactionError::Decode(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Decode a concatenation of witness-aware encodings.
    ///
    /// Every encoding must be complete; any failure rejects the whole
    /// stream. An empty stream yields an empty list.
    pub fn read_all(bytes: &[u8]) -> Result<Vec<Self>, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let mut txs = Vec::new();
        while !reader.is_empty() {
            txs.push(Self::read_from(&mut reader)?);
        }
        Ok(txs)
    }

    /// Deserialize one transaction with the witness-aware grammar.
    ///
    /// An empty input list followed by a non-zero byte is the witness
    /// marker; the byte is the flag field. Flag bit 1 introduces one
    /// witness stack per input. Any other flag bit is rejected, as is a
    /// witness section whose stacks are all empty.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let version = reader
            .read_i32_le()
            .map_err(|e| TransactionError::reading("version", e))?;

        let mut flags = 0u8;
        let mut inputs = read_inputs(reader)?;
        let outputs = if inputs.is_empty() {
            flags = reader
                .read_u8()
                .map_err(|e| TransactionError::reading("witness flag", e))?;
            if flags != 0 {
                inputs = read_inputs(reader)?;
                read_outputs(reader)?
            } else {
                Vec::new()
            }
        } else {
            read_outputs(reader)?
        };

        if flags & WITNESS_FLAG != 0 {
            flags ^= WITNESS_FLAG;
            for input in inputs.iter_mut() {
                input.read_witness(reader)?;
            }
            if !inputs.iter().any(TransactionInput::has_witness) {
                return Err(TransactionError::Decode("Superfluous witness record".into()));
            }
        }
        if flags != 0 {
            return Err(TransactionError::Decode(
                "Unknown transaction optional data".into(),
            ));
        }

        let lock_time = reader
            .read_u32_le()
            .map_err(|e| TransactionError::reading("lock time", e))?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Deserialize one transaction with the legacy grammar (no witness).
    pub fn read_legacy(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let version = reader
            .read_i32_le()
            .map_err(|e| TransactionError::reading("version", e))?;
        let inputs = read_inputs(reader)?;
        let outputs = read_outputs(reader)?;
        let lock_time = reader
            .read_u32_le()
            .map_err(|e| TransactionError::reading("lock time", e))?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize to the wire format, with witness data when present.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.write_to(&mut writer, self.has_witness());
        writer.into_bytes()
    }

    /// Serialize without witness data; the bytes the txid commits to.
    pub fn to_bytes_legacy(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.write_to(&mut writer, false);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn write_to(&self, writer: &mut WireWriter, with_witness: bool) {
        writer.write_i32_le(self.version);
        if with_witness {
            writer.write_u8(WITNESS_MARKER);
            writer.write_u8(WITNESS_FLAG);
        }
        writer.write_varint(self.inputs.len().into());
        for input in &self.inputs {
            input.write_to(writer);
        }
        writer.write_varint(self.outputs.len().into());
        for output in &self.outputs {
            output.write_to(writer);
        }
        if with_witness {
            for input in &self.inputs {
                input.write_witness(writer);
            }
        }
        writer.write_u32_le(self.lock_time);
    }

    // -----------------------------------------------------------------
    // Identity and size
    // -----------------------------------------------------------------

    /// Transaction id: double SHA-256 of the legacy encoding.
    pub fn tx_id(&self) -> Hash {
        Hash::sha256d(&self.to_bytes_legacy())
    }

    /// Witness transaction id: double SHA-256 of the full encoding.
    /// Equal to `tx_id` when no input carries witness data.
    pub fn wtx_id(&self) -> Hash {
        Hash::sha256d(&self.to_bytes())
    }

    /// Size of the full encoding in bytes.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Size of the legacy encoding in bytes.
    pub fn stripped_size(&self) -> usize {
        self.to_bytes_legacy().len()
    }

    pub fn weight(&self) -> usize {
        self.stripped_size() * (WITNESS_SCALE_FACTOR - 1) + self.size()
    }

    /// Virtual size: weight divided by four, rounded up.
    pub fn vsize(&self) -> usize {
        (self.weight() + WITNESS_SCALE_FACTOR - 1) / WITNESS_SCALE_FACTOR
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// True when any input carries a non-empty witness stack.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(TransactionInput::has_witness)
    }

    /// A coinbase has exactly one input, spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    /// Sum of all output values, or `None` on overflow.
    pub fn total_output_satoshis(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.satoshis))
    }
}

fn read_inputs(reader: &mut WireReader) -> Result<Vec<TransactionInput>, TransactionError> {
    let count = reader
        .read_count()
        .map_err(|e| TransactionError::reading("input count", e))?;
    let mut inputs = Vec::with_capacity(count);
    for _ in 0..count {
        inputs.push(TransactionInput::read_from(reader)?);
    }
    Ok(inputs)
}

fn read_outputs(reader: &mut WireReader) -> Result<Vec<TransactionOutput>, TransactionError> {
    let count = reader
        .read_count()
        .map_err(|e| TransactionError::reading("output count", e))?;
    let mut outputs = Vec::with_capacity(count);
    for _ in 0..count {
        outputs.push(TransactionOutput::read_from(reader)?);
    }
    Ok(outputs)
}
