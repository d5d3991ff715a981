//! Error types for the runtime

use bytedom_bytecode::{BytecodeError, Key, Opcode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("Binding error in {opcode}: {source}")]
    Binding {
        opcode: Opcode,
        #[source]
        source: anyhow::Error,
    },

    #[error("Callback error in {context}: {source}")]
    Callback {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Duplicate key {key} in one loop pass")]
    DuplicateKey { key: Key },

    #[error("Update queue did not settle after {rounds} flush rounds")]
    UpdateLoop { rounds: usize },

    #[error("Slot {slot} does not hold a {expected} slot")]
    SlotMismatch { slot: usize, expected: &'static str },

    #[error("Runtime invariant violated: {reason}")]
    Invariant { reason: &'static str },

    #[error("No mounted root for this container")]
    UnknownRoot,
}

impl RenderError {
    pub(crate) fn binding(opcode: Opcode) -> impl FnOnce(anyhow::Error) -> RenderError {
        move |source| RenderError::Binding { opcode, source }
    }

    pub(crate) fn callback(context: &'static str) -> impl FnOnce(anyhow::Error) -> RenderError {
        move |source| RenderError::Callback { context, source }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = RenderError::DuplicateKey { key: Key::from(7) };
        assert_eq!(err.to_string(), "Duplicate key 7 in one loop pass");

        let err = RenderError::binding(Opcode::TextDynamicContent)(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Binding error in TEXT_DYNAMIC_CONTENT: boom");

        let err = RenderError::UpdateLoop { rounds: 64 };
        assert_eq!(err.to_string(), "Update queue did not settle after 64 flush rounds");
    }

    #[test]
    fn test_bytecode_errors_convert() {
        let err: RenderError = BytecodeError::UnexpectedOperand { offset: 3 }.into();
        assert!(matches!(err, RenderError::Bytecode(_)));
    }
}
