//! Script chunk parsing and push encoding.
//!
//! A chunk is one operation: an opcode byte plus, for push opcodes
//! (`OP_0` through `OP_PUSHDATA4`), the bytes it pushes.

use crate::opcodes::*;
use crate::ScriptError;

/// One parsed operation of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// Pushed bytes; `Some` for every push opcode, including the empty push of `OP_0`.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// True when the opcode only pushes data.
    pub fn is_push(&self) -> bool {
        self.op <= OP_PUSHDATA4
    }
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], ScriptError> {
    let end = pos.checked_add(n).ok_or(ScriptError::DataTooSmall)?;
    if end > bytes.len() {
        return Err(ScriptError::DataTooSmall);
    }
    let slice = &bytes[*pos..end];
    *pos = end;
    Ok(slice)
}

/// Read the operation starting at `*pos` and advance past it.
pub fn read_chunk(bytes: &[u8], pos: &mut usize) -> Result<ScriptChunk, ScriptError> {
    let op = *take(bytes, pos, 1)?.first().ok_or(ScriptError::IndexOutOfRange)?;
    let len = match op {
        OP_0 => 0,
        OP_DATA_1..=OP_DATA_75 => op as usize,
        OP_PUSHDATA1 => take(bytes, pos, 1)?[0] as usize,
        OP_PUSHDATA2 => {
            let b = take(bytes, pos, 2)?;
            u16::from_le_bytes([b[0], b[1]]) as usize
        }
        OP_PUSHDATA4 => {
            let b = take(bytes, pos, 4)?;
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
        }
        _ => return Ok(ScriptChunk { op, data: None }),
    };
    let data = take(bytes, pos, len)?.to_vec();
    Ok(ScriptChunk { op, data: Some(data) })
}

/// Decode raw script bytes into chunks, failing on a truncated push.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        chunks.push(read_chunk(bytes, &mut pos)?);
    }
    Ok(chunks)
}

/// Prefix bytes for pushing `data_len` bytes with the smallest push opcode.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len < OP_PUSHDATA1 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xff {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xffff {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xffff_ffff {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode one stack element the way a push-only unlocking script carries it.
///
/// An empty element becomes `OP_0`, a single byte 1..=16 becomes the
/// matching `OP_N`, anything else is a minimal data push.
pub fn encode_stack_element(element: &[u8]) -> Result<Vec<u8>, ScriptError> {
    match element {
        [] => Ok(vec![OP_0]),
        [n @ 1..=16] => Ok(vec![OP_1 + n - 1]),
        _ => {
            let mut out = push_data_prefix(element.len())?;
            out.extend_from_slice(element);
            Ok(out)
        }
    }
}
