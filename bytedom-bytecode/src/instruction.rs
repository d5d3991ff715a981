//! Decoded, typed instructions.
//!
//! The wire format is a flat array of tags and operands; [`Program::decode`]
//! turns it into this form so the interpreter can dispatch by variant
//! instead of re-reading operands.
//!
//! [`Program::decode`]: crate::Program::decode

use crate::binding::{
    CollectionFn, ComputeFn, FactoryFn, HandlerFn, KeyFn, LifecycleFn, PropsFn, ShouldUpdateFn,
    TestFn,
};
use crate::opcode::Opcode;
use crate::program::Program;
use std::fmt;
use std::rc::Rc;

/// Index of a slot inside one program's slot space
pub type SlotId = usize;

/// Tag of an element to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTag {
    Div,
    Span,
    Named(Rc<str>),
}

impl ElementTag {
    pub fn as_str(&self) -> &str {
        match self {
            ElementTag::Div => "div",
            ElementTag::Span => "span",
            ElementTag::Named(name) => name,
        }
    }
}

/// Element property written by the property opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    ClassName,
    Id,
    Style,
}

/// Where a dynamic value comes from
#[derive(Clone)]
pub enum Binding {
    /// Call a function against the current scope
    Compute(ComputeFn),
    /// Read a field of the current props
    Prop(Rc<str>),
    /// Read the last value stored in a sibling value slot
    Sibling(SlotId),
}

impl Binding {
    pub fn is_computed(&self) -> bool {
        matches!(self, Binding::Compute(_))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Compute(_) => f.write_str("Compute(..)"),
            Binding::Prop(name) => f.debug_tuple("Prop").field(name).finish(),
            Binding::Sibling(slot) => f.debug_tuple("Sibling").field(slot).finish(),
        }
    }
}

/// Operands of a TERNARY instruction
pub struct TernarySpec {
    pub test: TestFn,
    pub slot: SlotId,
    pub consequent: Program,
    pub alternate: Program,
}

/// Operands of a LOOP_MAP instruction
pub struct LoopSpec {
    pub collection: CollectionFn,
    pub slot: SlotId,
    pub key: KeyFn,
    pub props: Option<PropsFn>,
    pub should_update: Option<ShouldUpdateFn>,
    pub template: Program,
    /// The loop's items are the only children of the enclosing element
    pub sole_child: bool,
}

/// Operands of a COMPONENT_INSTANCE instruction
pub struct ComponentSpec {
    pub factory: FactoryFn,
    pub slot: SlotId,
    pub program: Program,
}

/// One decoded instruction
#[derive(Clone)]
pub enum Instruction {
    OpenElement(ElementTag),
    CloseElement,
    OpenFragment,
    CloseFragment,
    StaticProperty {
        property: Property,
        value: Rc<str>,
    },
    DynamicProperty {
        property: Property,
        binding: Binding,
        slot: SlotId,
    },
    StaticAttribute {
        name: Rc<str>,
        value: Rc<str>,
    },
    DynamicAttribute {
        name: Rc<str>,
        binding: Binding,
        slot: SlotId,
    },
    StaticText(Rc<str>),
    DynamicText {
        binding: Binding,
        slot: SlotId,
    },
    StaticTextNode(Rc<str>),
    DynamicTextNode {
        binding: Binding,
        slot: SlotId,
    },
    Ternary(Rc<TernarySpec>),
    Loop(Rc<LoopSpec>),
    Component(Rc<ComponentSpec>),
    DidMount(LifecycleFn),
    DidUpdate(LifecycleFn),
    Event {
        name: Rc<str>,
        handler: HandlerFn,
        slot: SlotId,
        /// Re-register with the current props on every update pass
        refresh: bool,
    },
}

impl Instruction {
    /// The opcode this instruction was decoded from
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::OpenElement(ElementTag::Div) => Opcode::ElementOpenDiv,
            Instruction::OpenElement(ElementTag::Span) => Opcode::ElementOpenSpan,
            Instruction::OpenElement(ElementTag::Named(_)) => Opcode::ElementOpen,
            Instruction::CloseElement => Opcode::ElementClose,
            Instruction::OpenFragment => Opcode::FragmentOpen,
            Instruction::CloseFragment => Opcode::FragmentClose,
            Instruction::StaticProperty { property, .. } => match property {
                Property::ClassName => Opcode::PropertyStaticClassName,
                Property::Id => Opcode::PropertyStaticId,
                Property::Style => Opcode::PropertyStaticStyleCss,
            },
            Instruction::DynamicProperty { property, binding, .. } => {
                property_opcode(*property, binding.is_computed())
            }
            Instruction::StaticAttribute { .. } => Opcode::AttributeStatic,
            Instruction::DynamicAttribute { binding, .. } => {
                if binding.is_computed() {
                    Opcode::AttributeDynamic
                } else {
                    Opcode::AttributeDynamicFromSlot
                }
            }
            Instruction::StaticText(_) => Opcode::TextStaticContent,
            Instruction::DynamicText { .. } => Opcode::TextDynamicContent,
            Instruction::StaticTextNode(_) => Opcode::TextStaticNode,
            Instruction::DynamicTextNode { binding, .. } => {
                if binding.is_computed() {
                    Opcode::TextDynamicNode
                } else {
                    Opcode::TextDynamicNodeFromSlot
                }
            }
            Instruction::Ternary(_) => Opcode::Ternary,
            Instruction::Loop(_) => Opcode::LoopMap,
            Instruction::Component(_) => Opcode::ComponentInstance,
            Instruction::DidMount(_) => Opcode::ComponentLifecycleDidMount,
            Instruction::DidUpdate(_) => Opcode::ComponentLifecycleDidUpdate,
            Instruction::Event { refresh, .. } => {
                if *refresh {
                    Opcode::EventDynamicBound
                } else {
                    Opcode::EventStaticBound
                }
            }
        }
    }

    /// Slot written by this instruction, if any
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            Instruction::DynamicProperty { slot, .. }
            | Instruction::DynamicAttribute { slot, .. }
            | Instruction::DynamicText { slot, .. }
            | Instruction::DynamicTextNode { slot, .. }
            | Instruction::Event { slot, .. } => Some(*slot),
            Instruction::Ternary(spec) => Some(spec.slot),
            Instruction::Loop(spec) => Some(spec.slot),
            Instruction::Component(spec) => Some(spec.slot),
            _ => None,
        }
    }
}

pub(crate) fn property_opcode(property: Property, computed: bool) -> Opcode {
    match (property, computed) {
        (Property::ClassName, true) => Opcode::PropertyDynamicClassName,
        (Property::ClassName, false) => Opcode::PropertyDynamicClassNameFromSlot,
        (Property::Id, true) => Opcode::PropertyDynamicId,
        (Property::Id, false) => Opcode::PropertyDynamicIdFromSlot,
        (Property::Style, true) => Opcode::PropertyDynamicStyleCss,
        (Property::Style, false) => Opcode::PropertyDynamicStyleCssFromSlot,
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.opcode().name());
        match self {
            Instruction::OpenElement(tag) => {
                out.field("tag", &tag.as_str());
            }
            Instruction::StaticProperty { value, .. }
            | Instruction::StaticText(value)
            | Instruction::StaticTextNode(value) => {
                out.field("value", value);
            }
            Instruction::StaticAttribute { name, value } => {
                out.field("name", name).field("value", value);
            }
            Instruction::DynamicAttribute { name, binding, .. } => {
                out.field("name", name).field("binding", binding);
            }
            Instruction::DynamicProperty { binding, .. }
            | Instruction::DynamicText { binding, .. }
            | Instruction::DynamicTextNode { binding, .. } => {
                out.field("binding", binding);
            }
            Instruction::Loop(spec) => {
                out.field("template", &spec.template.len())
                    .field("sole_child", &spec.sole_child);
            }
            Instruction::Event { name, .. } => {
                out.field("event", name);
            }
            _ => {}
        }
        if let Some(slot) = self.slot() {
            out.field("slot", &slot);
        }
        out.finish()
    }
}
