//! Bytecode contract for bytedom
//!
//! This crate defines the flat wire format a UI compiler emits, the typed
//! instruction form the runtime executes, and the component/state types the
//! bytecode's function operands see.
//!
//! A wire program is a sequence of [`Word`]s: an opcode tag followed by that
//! opcode's fixed-arity operands. [`Program::decode`] validates nesting,
//! operand arity and types, slot usage and loop placement up front, so the
//! runtime never has to deal with a malformed stream mid-mount.

pub mod binding;
pub mod builder;
pub mod component;
mod decoder;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod plan;
pub mod program;
pub mod word;

pub use binding::{Event, Key, Scope};
pub use builder::{LoopOptions, ProgramBuilder, SlotSource};
pub use component::{
    merge_state, ComponentInstance, InstanceId, QueuedUpdate, StateCallback, StateUpdate,
    UpdateQueue,
};
pub use error::{BytecodeError, InvalidKey, Result};
pub use instruction::{Binding, ElementTag, Instruction, Property, SlotId};
pub use opcode::Opcode;
pub use plan::{Plan, PlanBuilder, UnmountOp, UpdateOp};
pub use program::Program;
pub use word::Word;
