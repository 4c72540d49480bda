//! Per-input signing material.

use rawtx_script::{Script, ScriptError};
use rawtx_transaction::Transaction;

/// The unlocking script and witness stack of one input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureData {
    pub script_sig: Script,
    pub witness: Vec<Vec<u8>>,
}

impl SignatureData {
    /// Material input `index` of `tx` already carries; empty when the
    /// index is out of range.
    pub fn from_input(tx: &Transaction, index: usize) -> Self {
        tx.inputs
            .get(index)
            .map(|input| SignatureData {
                script_sig: input.unlocking_script.clone(),
                witness: input.witness.clone(),
            })
            .unwrap_or_default()
    }

    /// Overwrite input `index` of `tx` with this material.
    pub fn apply_to(&self, tx: &mut Transaction, index: usize) {
        if let Some(input) = tx.inputs.get_mut(index) {
            input.unlocking_script = self.script_sig.clone();
            input.witness = self.witness.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.script_sig.is_empty() && self.witness.is_empty()
    }
}

/// Signing material as two stacks: the elements the unlocking script
/// pushes and the witness items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Stacks {
    pub script: Vec<Vec<u8>>,
    pub witness: Vec<Vec<u8>>,
}

impl Stacks {
    pub fn from_script(script: Vec<Vec<u8>>) -> Self {
        Stacks {
            script,
            witness: Vec::new(),
        }
    }

    /// An unlocking script that is not push-only contributes nothing.
    pub fn from_data(data: &SignatureData) -> Self {
        Stacks {
            script: data.script_sig.push_stack().unwrap_or_default(),
            witness: data.witness.clone(),
        }
    }

    pub fn into_data(self) -> Result<SignatureData, ScriptError> {
        Ok(SignatureData {
            script_sig: Script::from_push_stack(&self.script)?,
            witness: self.witness,
        })
    }
}
