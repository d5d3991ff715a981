//! Error types for program decoding

use crate::opcode::Opcode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BytecodeError {
    #[error("Unrecognized instruction: tag {tag} at offset {offset}")]
    UnrecognizedInstruction { tag: u8, offset: usize },

    #[error("Unsupported instruction: {opcode} at offset {offset}")]
    UnsupportedInstruction { opcode: Opcode, offset: usize },

    #[error("Operand word at offset {offset} where an instruction was expected")]
    UnexpectedOperand { offset: usize },

    #[error("{opcode} at offset {offset} is missing its {operand} operand")]
    MissingOperand {
        opcode: Opcode,
        offset: usize,
        operand: &'static str,
    },

    #[error("{opcode} at offset {offset}: {operand} operand must be {expected}")]
    OperandType {
        opcode: Opcode,
        offset: usize,
        operand: &'static str,
        expected: &'static str,
    },

    #[error("{opcode} at offset {offset} has no matching open instruction")]
    UnbalancedClose { opcode: Opcode, offset: usize },

    #[error("{opcode} at offset {offset} is never closed")]
    Unclosed { opcode: Opcode, offset: usize },

    #[error("{opcode} at offset {offset} requires an open element")]
    ExpectedElement { opcode: Opcode, offset: usize },

    #[error("LOOP_MAP at offset {offset}: {reason}")]
    LoopPlacement { offset: usize, reason: &'static str },

    #[error("{opcode} at offset {offset} mixes text content with child nodes")]
    MixedTextContent { opcode: Opcode, offset: usize },

    #[error("Slot {slot} at offset {offset} is out of range (a program of {limit} words)")]
    SlotOutOfRange { slot: i64, offset: usize, limit: usize },

    #[error("Slot {slot} is assigned twice (second use at offset {offset})")]
    DuplicateSlot { slot: usize, offset: usize },

    #[error("Slot source {slot} at offset {offset} does not name an earlier value slot")]
    InvalidSlotSource { slot: usize, offset: usize },

    #[error("In sub-program of {opcode} at offset {offset}: {source}")]
    Subprogram {
        opcode: Opcode,
        offset: usize,
        #[source]
        source: Box<BytecodeError>,
    },
}

/// A value that cannot act as a loop key
#[derive(Error, Debug)]
#[error("Value {0} cannot be used as a loop key")]
pub struct InvalidKey(pub String);

pub type Result<T> = std::result::Result<T, BytecodeError>;
