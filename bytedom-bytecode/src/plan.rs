//! Reduced update and unmount programs.
//!
//! Mount walks the full instruction list; everything it learns about which
//! instructions can change afterwards is recorded here once per [`Program`]
//! and reused by every later pass of every node mounted from that program.
//!
//! [`Program`]: crate::Program

use crate::binding::{HandlerFn, LifecycleFn};
use crate::instruction::{property_opcode, Binding, LoopSpec, Property, SlotId, TernarySpec};
use crate::opcode::Opcode;
use std::rc::Rc;

/// Instruction of the update program
#[derive(Clone)]
pub enum UpdateOp {
    Property {
        property: Property,
        binding: Binding,
        slot: SlotId,
    },
    Attribute {
        name: Rc<str>,
        binding: Binding,
        slot: SlotId,
    },
    /// Text content of an element or a standalone text node
    Text {
        opcode: Opcode,
        binding: Binding,
        slot: SlotId,
    },
    Ternary(Rc<TernarySpec>),
    Loop(Rc<LoopSpec>),
    /// Re-render a nested component node
    Component { slot: SlotId },
    DidUpdate(LifecycleFn),
    /// Refresh a delegated registration's props
    RefreshEvent {
        name: Rc<str>,
        handler: HandlerFn,
        slot: SlotId,
    },
}

impl UpdateOp {
    pub fn opcode(&self) -> Opcode {
        match self {
            UpdateOp::Property { property, binding, .. } => {
                property_opcode(*property, binding.is_computed())
            }
            UpdateOp::Attribute { binding, .. } => {
                if binding.is_computed() {
                    Opcode::AttributeDynamic
                } else {
                    Opcode::AttributeDynamicFromSlot
                }
            }
            UpdateOp::Text { opcode, .. } => *opcode,
            UpdateOp::Ternary(_) => Opcode::Ternary,
            UpdateOp::Loop(_) => Opcode::LoopMap,
            UpdateOp::Component { .. } => Opcode::ComponentInstance,
            UpdateOp::DidUpdate(_) => Opcode::ComponentLifecycleDidUpdate,
            UpdateOp::RefreshEvent { .. } => Opcode::EventDynamicBound,
        }
    }
}

/// Instruction of the unmount program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmountOp {
    /// Drop the delegated registration stored in `slot`
    ReleaseEvent { name: Rc<str>, slot: SlotId },
    /// Unmount the live branch of a ternary
    Ternary { slot: SlotId },
    /// Unmount every item of a loop
    Loop { slot: SlotId },
    /// Unmount a nested component
    Component { slot: SlotId },
}

/// The two derived programs
#[derive(Clone, Default)]
pub struct Plan {
    update: Vec<UpdateOp>,
    unmount: Vec<UnmountOp>,
}

impl Plan {
    pub fn update(&self) -> &[UpdateOp] {
        &self.update
    }

    pub fn unmount(&self) -> &[UnmountOp] {
        &self.unmount
    }

    /// Whether an update pass could ever write anything
    pub fn is_static(&self) -> bool {
        self.update.is_empty()
    }
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let update: Vec<Opcode> = self.update.iter().map(UpdateOp::opcode).collect();
        f.debug_struct("Plan")
            .field("update", &update)
            .field("unmount", &self.unmount)
            .finish()
    }
}

/// Collects the plan while a mount pass runs
#[derive(Default)]
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_update(&mut self, op: UpdateOp) {
        self.plan.update.push(op);
    }

    pub fn push_unmount(&mut self, op: UnmountOp) {
        self.plan.unmount.push(op);
    }

    pub fn finish(self) -> Plan {
        self.plan
    }
}
