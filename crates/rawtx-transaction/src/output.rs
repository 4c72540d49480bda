//! Transaction output with a value and locking script.

use rawtx_primitives::util::{WireReader, WireWriter};
use rawtx_script::Script;

use crate::TransactionError;

/// A single transaction output.
///
/// # Wire format
///
/// | Field          | Size         |
/// |----------------|--------------|
/// | satoshis       | 8 bytes (LE) |
/// | script length  | VarInt       |
/// | locking_script | variable     |
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Value in base units (1 coin = 10^8).
    pub satoshis: u64,

    /// The locking script (scriptPubKey) that defines spending conditions.
    pub locking_script: Script,
}

impl TransactionOutput {
    pub fn new(satoshis: u64, locking_script: Script) -> Self {
        TransactionOutput {
            satoshis,
            locking_script,
        }
    }

    /// The placeholder output written before the signed index under
    /// SINGLE hashing: value `-1` with an empty script.
    pub(crate) fn null() -> Self {
        TransactionOutput {
            satoshis: u64::MAX,
            locking_script: Script::new(),
        }
    }

    /// Deserialize an output.
    ///
    /// # Returns
    /// `Ok(TransactionOutput)` on success, or a `Decode` error if the data
    /// is truncated.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let satoshis = reader
            .read_u64_le()
            .map_err(|e| TransactionError::reading("satoshis", e))?;
        let script_bytes = reader
            .read_var_bytes()
            .map_err(|e| TransactionError::reading("locking script", e))?;

        Ok(TransactionOutput {
            satoshis,
            locking_script: Script::from_bytes(script_bytes),
        })
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_var_bytes(self.locking_script.as_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_wire_layout() {
        let output = TransactionOutput::new(1_500, Script::from_bytes(&[0x6a, 0x01, 0xff]));
        let bytes = output.to_bytes();
        assert_eq!(hex::encode(&bytes), "dc05000000000000036a01ff");

        let mut reader = WireReader::new(&bytes);
        assert_eq!(TransactionOutput::read_from(&mut reader).expect("decode"), output);
    }

    #[test]
    fn test_null_output_value() {
        let bytes = TransactionOutput::null().to_bytes();
        assert_eq!(hex::encode(bytes), "ffffffffffffffff00");
    }
}
