//! Block headers and blocks.

use rawtx_primitives::chainhash::Hash;
use rawtx_primitives::util::{VarInt, WireReader, WireWriter};
use rawtx_transaction::Transaction;

use crate::error::SpvError;
use crate::merkle_tree_parent::compute_merkle_root;

/// Size of a serialized block header.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// An 80-byte block header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn read_from(reader: &mut WireReader) -> Result<Self, SpvError> {
        Ok(BlockHeader {
            version: reader.read_i32_le().map_err(|e| SpvError::reading("version", e))?,
            prev_block: reader.read_hash().map_err(|e| SpvError::reading("previous block", e))?,
            merkle_root: reader.read_hash().map_err(|e| SpvError::reading("merkle root", e))?,
            time: reader.read_u32_le().map_err(|e| SpvError::reading("time", e))?,
            bits: reader.read_u32_le().map_err(|e| SpvError::reading("bits", e))?,
            nonce: reader.read_u32_le().map_err(|e| SpvError::reading("nonce", e))?,
        })
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_i32_le(self.version);
        writer.write_hash(&self.prev_block);
        writer.write_hash(&self.merkle_root);
        writer.write_u32_le(self.time);
        writer.write_u32_le(self.bits);
        writer.write_u32_le(self.nonce);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(BLOCK_HEADER_SIZE);
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Block hash: double SHA-256 of the serialized header.
    pub fn hash(&self) -> Hash {
        Hash::sha256d(&self.to_bytes())
    }
}

/// A header and its ordered transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Block { header, transactions }
    }

    /// Decode a block with witness-aware transactions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        let mut reader = WireReader::new(bytes);
        let header = BlockHeader::read_from(&mut reader)?;
        let count = reader
            .read_count()
            .map_err(|e| SpvError::reading("transaction count", e))?;
        let mut transactions = Vec::with_capacity(count);
        for _ in 0..count {
            transactions.push(Transaction::read_from(&mut reader)?);
        }
        if !reader.is_empty() {
            return Err(SpvError::Decode(format!(
                "{} trailing bytes after block",
                reader.remaining()
            )));
        }
        Ok(Block { header, transactions })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.header.write_to(&mut writer);
        writer.write_varint(VarInt(self.transactions.len() as u64));
        for tx in &self.transactions {
            writer.write_bytes(&tx.to_bytes());
        }
        writer.into_bytes()
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Transaction identifiers in block order.
    pub fn txids(&self) -> Vec<Hash> {
        self.transactions.iter().map(Transaction::tx_id).collect()
    }

    /// Merkle root over the transaction identifiers.
    pub fn compute_merkle_root(&self) -> Hash {
        compute_merkle_root(&self.txids())
    }
}
