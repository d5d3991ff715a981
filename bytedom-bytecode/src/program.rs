//! Immutable, shareable programs.

use crate::decoder::Decoder;
use crate::error::Result;
use crate::instruction::Instruction;
use crate::plan::Plan;
use crate::word::Word;
use once_cell::unsync::OnceCell;
use std::fmt;
use std::rc::Rc;

struct ProgramData {
    instructions: Vec<Instruction>,
    slot_count: usize,
    plan: OnceCell<Plan>,
}

/// A decoded program. Cloning shares the instructions and the derived plan.
#[derive(Clone)]
pub struct Program(Rc<ProgramData>);

impl Program {
    /// Decode and validate a wire program
    pub fn decode(words: &[Word]) -> Result<Program> {
        Decoder::new(words).decode()
    }

    pub(crate) fn from_parts(instructions: Vec<Instruction>, slot_count: usize) -> Self {
        Program(Rc::new(ProgramData {
            instructions,
            slot_count,
            plan: OnceCell::new(),
        }))
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.0.instructions
    }

    pub fn len(&self) -> usize {
        self.0.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.instructions.is_empty()
    }

    /// Size of the slot space: one past the highest slot id used
    pub fn slot_count(&self) -> usize {
        self.0.slot_count
    }

    /// The derived update/unmount plan, once a first mount has produced it
    pub fn plan(&self) -> Option<&Plan> {
        self.0.plan.get()
    }

    /// Store the plan derived by a mount pass. The first plan installed wins;
    /// later calls return it unchanged.
    pub fn install_plan(&self, plan: Plan) -> &Plan {
        self.0.plan.get_or_init(|| plan)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Program) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("instructions", &self.0.instructions)
            .field("slot_count", &self.0.slot_count)
            .field("planned", &self.0.plan.get().is_some())
            .finish()
    }
}
