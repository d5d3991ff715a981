//! Wire program decoder and structural validator.
//!
//! Operands are consumed strictly left to right with a single cursor. Every
//! structural rule is checked here so that a program which decodes cleanly
//! can be mounted without the interpreter ever reading past an instruction.
//!
//! Slot ids are bounded by the length of the program they appear in: every
//! slot-bearing instruction takes at least two words, so a denser numbering
//! always exists and a larger id can only be a malformed operand.

use crate::error::{BytecodeError, Result};
use crate::instruction::{
    Binding, ComponentSpec, ElementTag, Instruction, LoopSpec, Property, SlotId, TernarySpec,
};
use crate::opcode::Opcode;
use crate::program::Program;
use crate::word::Word;
use rustc_hash::FxHashSet;
use std::rc::Rc;

enum Frame {
    Element {
        offset: usize,
        opcode: Opcode,
        /// Child-producing instructions seen so far
        children: usize,
        /// Offset of a loop already placed in this element
        loop_offset: Option<usize>,
        /// Whether a text-content instruction owns this element's children
        text_content: bool,
    },
    Fragment {
        offset: usize,
    },
}

pub(crate) struct Decoder<'a> {
    words: &'a [Word],
    pos: usize,
    instructions: Vec<Instruction>,
    frames: Vec<Frame>,
    used_slots: FxHashSet<SlotId>,
    /// Slots holding a leaf value, readable by later `*_FROM_SLOT` operands
    value_slots: FxHashSet<SlotId>,
    slot_count: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(words: &'a [Word]) -> Self {
        Self {
            words,
            pos: 0,
            instructions: Vec::new(),
            frames: Vec::new(),
            used_slots: FxHashSet::default(),
            value_slots: FxHashSet::default(),
            slot_count: 0,
        }
    }

    pub(crate) fn decode(mut self) -> Result<Program> {
        while self.pos < self.words.len() {
            let offset = self.pos;
            let tag = match &self.words[offset] {
                Word::Op(tag) => *tag,
                _ => return Err(BytecodeError::UnexpectedOperand { offset }),
            };
            self.pos += 1;
            let opcode = Opcode::from_tag(tag)
                .ok_or(BytecodeError::UnrecognizedInstruction { tag, offset })?;
            let instruction = self.instruction(opcode, offset)?;
            self.instructions.push(instruction);
        }

        if let Some(frame) = self.frames.last() {
            let (opcode, offset) = match frame {
                Frame::Element { opcode, offset, .. } => (*opcode, *offset),
                Frame::Fragment { offset } => (Opcode::FragmentOpen, *offset),
            };
            return Err(BytecodeError::Unclosed { opcode, offset });
        }

        Ok(Program::from_parts(self.instructions, self.slot_count))
    }

    fn instruction(&mut self, opcode: Opcode, offset: usize) -> Result<Instruction> {
        use Opcode::*;
        let instruction = match opcode {
            ElementOpen => {
                let tag = self.string(opcode, offset, "tag name")?;
                self.open_element(opcode, offset, ElementTag::Named(tag))?
            }
            ElementOpenDiv => self.open_element(opcode, offset, ElementTag::Div)?,
            ElementOpenSpan => self.open_element(opcode, offset, ElementTag::Span)?,
            ElementClose => match self.frames.pop() {
                Some(Frame::Element { .. }) => Instruction::CloseElement,
                other => {
                    self.frames.extend(other);
                    return Err(BytecodeError::UnbalancedClose { opcode, offset });
                }
            },
            FragmentOpen => {
                self.frames.push(Frame::Fragment { offset });
                Instruction::OpenFragment
            }
            FragmentClose => match self.frames.pop() {
                Some(Frame::Fragment { .. }) => Instruction::CloseFragment,
                other => {
                    self.frames.extend(other);
                    return Err(BytecodeError::UnbalancedClose { opcode, offset });
                }
            },

            PropertyStaticClassName | PropertyStaticId | PropertyStaticStyleCss => {
                self.expect_element(opcode, offset)?;
                let value = self.string(opcode, offset, "value")?;
                let property = match opcode {
                    PropertyStaticClassName => Property::ClassName,
                    PropertyStaticId => Property::Id,
                    _ => Property::Style,
                };
                Instruction::StaticProperty { property, value }
            }
            PropertyDynamicClassName | PropertyDynamicId | PropertyDynamicStyleCss => {
                self.expect_element(opcode, offset)?;
                let binding = Binding::Compute(self.compute(opcode, offset)?);
                let slot = self.value_slot(opcode, offset)?;
                let property = match opcode {
                    PropertyDynamicClassName => Property::ClassName,
                    PropertyDynamicId => Property::Id,
                    _ => Property::Style,
                };
                Instruction::DynamicProperty { property, binding, slot }
            }
            PropertyDynamicClassNameFromSlot | PropertyDynamicIdFromSlot
            | PropertyDynamicStyleCssFromSlot => {
                self.expect_element(opcode, offset)?;
                let binding = self.source(opcode, offset)?;
                let slot = self.value_slot(opcode, offset)?;
                let property = match opcode {
                    PropertyDynamicClassNameFromSlot => Property::ClassName,
                    PropertyDynamicIdFromSlot => Property::Id,
                    _ => Property::Style,
                };
                Instruction::DynamicProperty { property, binding, slot }
            }

            AttributeStatic => {
                self.expect_element(opcode, offset)?;
                let name = self.string(opcode, offset, "attribute name")?;
                let value = self.string(opcode, offset, "value")?;
                Instruction::StaticAttribute { name, value }
            }
            AttributeDynamic => {
                self.expect_element(opcode, offset)?;
                let name = self.string(opcode, offset, "attribute name")?;
                let binding = Binding::Compute(self.compute(opcode, offset)?);
                let slot = self.value_slot(opcode, offset)?;
                Instruction::DynamicAttribute { name, binding, slot }
            }
            AttributeDynamicFromSlot => {
                self.expect_element(opcode, offset)?;
                let name = self.string(opcode, offset, "attribute name")?;
                let binding = self.source(opcode, offset)?;
                let slot = self.value_slot(opcode, offset)?;
                Instruction::DynamicAttribute { name, binding, slot }
            }

            TextStaticContent => {
                self.expect_element(opcode, offset)?;
                self.text_content(opcode, offset)?;
                Instruction::StaticText(self.string(opcode, offset, "text")?)
            }
            TextDynamicContent => {
                self.expect_element(opcode, offset)?;
                self.text_content(opcode, offset)?;
                let binding = Binding::Compute(self.compute(opcode, offset)?);
                let slot = self.value_slot(opcode, offset)?;
                Instruction::DynamicText { binding, slot }
            }
            TextStaticNode => {
                self.child(opcode, offset)?;
                Instruction::StaticTextNode(self.string(opcode, offset, "text")?)
            }
            TextDynamicNode => {
                self.child(opcode, offset)?;
                let binding = Binding::Compute(self.compute(opcode, offset)?);
                let slot = self.value_slot(opcode, offset)?;
                Instruction::DynamicTextNode { binding, slot }
            }
            TextDynamicNodeFromSlot => {
                self.child(opcode, offset)?;
                let binding = self.source(opcode, offset)?;
                let slot = self.value_slot(opcode, offset)?;
                Instruction::DynamicTextNode { binding, slot }
            }

            Ternary => {
                self.child(opcode, offset)?;
                let test = match self.operand(opcode, offset, "test")? {
                    Word::Test(f) => f.clone(),
                    _ => return Err(self.mistyped(opcode, offset, "test", "a test function")),
                };
                let slot = self.slot(opcode, offset)?;
                let consequent = self.subprogram(opcode, offset, "consequent")?;
                let alternate = self.subprogram(opcode, offset, "alternate")?;
                Instruction::Ternary(Rc::new(TernarySpec {
                    test,
                    slot,
                    consequent,
                    alternate,
                }))
            }
            LoopMap => self.loop_map(offset)?,
            ComponentInstance => {
                self.child(opcode, offset)?;
                let factory = match self.operand(opcode, offset, "factory")? {
                    Word::Factory(f) => f.clone(),
                    _ => return Err(self.mistyped(opcode, offset, "factory", "a factory function")),
                };
                let slot = self.slot(opcode, offset)?;
                let program = self.subprogram(opcode, offset, "program")?;
                Instruction::Component(Rc::new(ComponentSpec {
                    factory,
                    slot,
                    program,
                }))
            }
            ComponentLifecycleDidMount | ComponentLifecycleDidUpdate => {
                let callback = match self.operand(opcode, offset, "callback")? {
                    Word::Lifecycle(f) => f.clone(),
                    _ => {
                        return Err(self.mistyped(
                            opcode,
                            offset,
                            "callback",
                            "a lifecycle function",
                        ))
                    }
                };
                if opcode == ComponentLifecycleDidMount {
                    Instruction::DidMount(callback)
                } else {
                    Instruction::DidUpdate(callback)
                }
            }

            EventStaticBound | EventDynamicBound => {
                self.expect_element(opcode, offset)?;
                let name = self.string(opcode, offset, "event name")?;
                let handler = match self.operand(opcode, offset, "handler")? {
                    Word::Handler(f) => f.clone(),
                    _ => return Err(self.mistyped(opcode, offset, "handler", "a handler function")),
                };
                let slot = self.slot(opcode, offset)?;
                Instruction::Event {
                    name,
                    handler,
                    slot,
                    refresh: opcode == EventDynamicBound,
                }
            }

            TernaryFromSlot
            | RefCallback
            | LoopMapFromSlot
            | StoreSlotValue
            | ComponentLifecycleShouldUpdate
            | ComponentLifecycleWillMount
            | ComponentLifecycleWillUpdate
            | ComponentLifecycleWillReceiveProps
            | ComponentLifecycleWillUnmount
            | ComponentLifecycleDidCatch
            | EventDynamicBoundFromSlot => {
                return Err(BytecodeError::UnsupportedInstruction { opcode, offset })
            }
        };
        Ok(instruction)
    }

    fn open_element(
        &mut self,
        opcode: Opcode,
        offset: usize,
        tag: ElementTag,
    ) -> Result<Instruction> {
        // counted against the parent before the new frame is pushed
        self.child(opcode, offset)?;
        self.frames.push(Frame::Element {
            offset,
            opcode,
            children: 0,
            loop_offset: None,
            text_content: false,
        });
        Ok(Instruction::OpenElement(tag))
    }

    fn loop_map(&mut self, offset: usize) -> Result<Instruction> {
        let opcode = Opcode::LoopMap;
        let children_before = match self.enclosing_element() {
            Some(Frame::Element { children, .. }) => *children,
            _ => {
                return Err(BytecodeError::LoopPlacement {
                    offset,
                    reason: "a loop must be inside an element",
                })
            }
        };
        self.child(opcode, offset)?;
        if let Some(Frame::Element { loop_offset, .. }) = self.enclosing_element_mut() {
            *loop_offset = Some(offset);
        }

        let collection = match self.operand(opcode, offset, "collection")? {
            Word::Collection(f) => f.clone(),
            _ => {
                return Err(self.mistyped(opcode, offset, "collection", "a collection function"))
            }
        };
        let slot = self.slot(opcode, offset)?;
        let key = match self.operand(opcode, offset, "key")? {
            Word::Key(f) => f.clone(),
            _ => return Err(self.mistyped(opcode, offset, "key", "a key function")),
        };
        let props = match self.operand(opcode, offset, "props")? {
            Word::Props(f) => Some(f.clone()),
            Word::Null => None,
            _ => return Err(self.mistyped(opcode, offset, "props", "a props function or null")),
        };
        let should_update = match self.operand(opcode, offset, "should-update")? {
            Word::ShouldUpdate(f) => Some(f.clone()),
            Word::Null => None,
            _ => {
                return Err(self.mistyped(
                    opcode,
                    offset,
                    "should-update",
                    "a should-update function or null",
                ))
            }
        };
        let template = self.subprogram(opcode, offset, "template")?;

        Ok(Instruction::Loop(Rc::new(LoopSpec {
            collection,
            slot,
            key,
            props,
            should_update,
            template,
            sole_child: children_before == 0,
        })))
    }

    fn enclosing_element(&self) -> Option<&Frame> {
        self.frames
            .iter()
            .rev()
            .find(|frame| matches!(frame, Frame::Element { .. }))
    }

    fn enclosing_element_mut(&mut self) -> Option<&mut Frame> {
        self.frames
            .iter_mut()
            .rev()
            .find(|frame| matches!(frame, Frame::Element { .. }))
    }

    /// Record a child-producing instruction against the enclosing element
    fn child(&mut self, opcode: Opcode, offset: usize) -> Result<()> {
        if let Some(Frame::Element {
            children,
            loop_offset,
            text_content,
            ..
        }) = self.enclosing_element_mut()
        {
            if *text_content {
                return Err(BytecodeError::MixedTextContent { opcode, offset });
            }
            if let Some(offset) = *loop_offset {
                return Err(BytecodeError::LoopPlacement {
                    offset,
                    reason: "a loop must be the last child of its element",
                });
            }
            *children += 1;
        }
        Ok(())
    }

    /// Text content replaces every child of the open element, so it cannot
    /// share the element with child-producing instructions
    fn text_content(&mut self, opcode: Opcode, offset: usize) -> Result<()> {
        if let Some(Frame::Element {
            children,
            text_content,
            ..
        }) = self.frames.last_mut()
        {
            if *children > 0 {
                return Err(BytecodeError::MixedTextContent { opcode, offset });
            }
            *text_content = true;
        }
        Ok(())
    }

    fn expect_element(&self, opcode: Opcode, offset: usize) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Element { .. }) => Ok(()),
            _ => Err(BytecodeError::ExpectedElement { opcode, offset }),
        }
    }

    fn operand(
        &mut self,
        opcode: Opcode,
        offset: usize,
        operand: &'static str,
    ) -> Result<&'a Word> {
        let words = self.words;
        match words.get(self.pos) {
            None | Some(Word::Op(_)) => Err(BytecodeError::MissingOperand {
                opcode,
                offset,
                operand,
            }),
            Some(word) => {
                self.pos += 1;
                Ok(word)
            }
        }
    }

    fn mistyped(
        &self,
        opcode: Opcode,
        offset: usize,
        operand: &'static str,
        expected: &'static str,
    ) -> BytecodeError {
        BytecodeError::OperandType {
            opcode,
            offset,
            operand,
            expected,
        }
    }

    fn string(&mut self, opcode: Opcode, offset: usize, operand: &'static str) -> Result<Rc<str>> {
        match self.operand(opcode, offset, operand)? {
            Word::Str(s) => Ok(s.clone()),
            _ => Err(self.mistyped(opcode, offset, operand, "a string")),
        }
    }

    fn compute(&mut self, opcode: Opcode, offset: usize) -> Result<crate::binding::ComputeFn> {
        match self.operand(opcode, offset, "value")? {
            Word::Compute(f) => Ok(f.clone()),
            _ => Err(self.mistyped(opcode, offset, "value", "a compute function")),
        }
    }

    /// Source operand of a `*_FROM_SLOT` instruction
    fn source(&mut self, opcode: Opcode, offset: usize) -> Result<Binding> {
        match self.operand(opcode, offset, "source")? {
            Word::Str(name) => Ok(Binding::Prop(name.clone())),
            Word::Int(n) if *n >= 0 && self.value_slots.contains(&(*n as usize)) => {
                Ok(Binding::Sibling(*n as usize))
            }
            Word::Int(n) => Err(BytecodeError::InvalidSlotSource {
                slot: (*n).max(0) as usize,
                offset,
            }),
            _ => Err(self.mistyped(opcode, offset, "source", "a prop name or slot index")),
        }
    }

    fn slot(&mut self, opcode: Opcode, offset: usize) -> Result<SlotId> {
        let limit = self.words.len();
        let slot = match self.operand(opcode, offset, "slot")? {
            Word::Int(n) if *n < 0 => {
                return Err(self.mistyped(opcode, offset, "slot", "a non-negative slot index"))
            }
            Word::Int(n) => match usize::try_from(*n) {
                Ok(slot) if slot < limit => slot,
                _ => {
                    return Err(BytecodeError::SlotOutOfRange {
                        slot: *n,
                        offset,
                        limit,
                    })
                }
            },
            _ => return Err(self.mistyped(opcode, offset, "slot", "a non-negative slot index")),
        };
        if !self.used_slots.insert(slot) {
            return Err(BytecodeError::DuplicateSlot { slot, offset });
        }
        self.slot_count = self.slot_count.max(slot + 1);
        Ok(slot)
    }

    fn value_slot(&mut self, opcode: Opcode, offset: usize) -> Result<SlotId> {
        let slot = self.slot(opcode, offset)?;
        self.value_slots.insert(slot);
        Ok(slot)
    }

    fn subprogram(
        &mut self,
        opcode: Opcode,
        offset: usize,
        operand: &'static str,
    ) -> Result<Program> {
        match self.operand(opcode, offset, operand)? {
            Word::Program(words) => {
                Decoder::new(words)
                    .decode()
                    .map_err(|source| BytecodeError::Subprogram {
                        opcode,
                        offset,
                        source: Box::new(source),
                    })
            }
            _ => Err(self.mistyped(opcode, offset, operand, "a sub-program")),
        }
    }
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
