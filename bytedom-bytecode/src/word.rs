//! Entries of a flat wire program.

use crate::binding::{
    CollectionFn, ComputeFn, FactoryFn, HandlerFn, KeyFn, LifecycleFn, PropsFn, ShouldUpdateFn,
    TestFn,
};
use crate::opcode::Opcode;
use std::fmt;
use std::rc::Rc;

/// One entry of a wire program: an opcode tag or one of its operands
#[derive(Clone)]
pub enum Word {
    /// Opcode tag
    Op(u8),
    /// String literal (tag name, class, attribute name, prop name, ...)
    Str(Rc<str>),
    /// Integer literal (slot index)
    Int(i64),
    /// Absent optional operand
    Null,
    Compute(ComputeFn),
    Test(TestFn),
    Collection(CollectionFn),
    Key(KeyFn),
    Props(PropsFn),
    ShouldUpdate(ShouldUpdateFn),
    Factory(FactoryFn),
    Lifecycle(LifecycleFn),
    Handler(HandlerFn),
    /// Nested sub-program
    Program(Vec<Word>),
}

impl Word {
    pub fn op(opcode: Opcode) -> Self {
        Word::Op(opcode.tag())
    }

    pub fn str(value: impl AsRef<str>) -> Self {
        Word::Str(Rc::from(value.as_ref()))
    }

    /// Slot index operand. Indices past `i64::MAX` saturate, and the decoder
    /// rejects them as out of range.
    pub fn slot(slot: usize) -> Self {
        Word::Int(i64::try_from(slot).unwrap_or(i64::MAX))
    }

    /// Operand kind used in decode errors
    pub fn kind(&self) -> &'static str {
        match self {
            Word::Op(_) => "opcode",
            Word::Str(_) => "string",
            Word::Int(_) => "integer",
            Word::Null => "null",
            Word::Compute(_) => "compute function",
            Word::Test(_) => "test function",
            Word::Collection(_) => "collection function",
            Word::Key(_) => "key function",
            Word::Props(_) => "props function",
            Word::ShouldUpdate(_) => "should-update function",
            Word::Factory(_) => "factory function",
            Word::Lifecycle(_) => "lifecycle function",
            Word::Handler(_) => "handler function",
            Word::Program(_) => "sub-program",
        }
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Op(tag) => match Opcode::from_tag(*tag) {
                Some(opcode) => write!(f, "{}", opcode),
                None => write!(f, "Op({})", tag),
            },
            Word::Str(s) => write!(f, "{:?}", s),
            Word::Int(n) => write!(f, "{}", n),
            Word::Null => f.write_str("null"),
            Word::Program(words) => f.debug_list().entries(words).finish(),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl From<Opcode> for Word {
    fn from(opcode: Opcode) -> Self {
        Word::op(opcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_saturates_instead_of_wrapping() {
        assert!(matches!(Word::slot(7), Word::Int(7)));
        let expected = i64::try_from(usize::MAX).unwrap_or(i64::MAX);
        assert!(matches!(Word::slot(usize::MAX), Word::Int(n) if n == expected && n > 0));
    }
}
