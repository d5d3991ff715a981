//! Mounted program instances and their slots.

use bytedom_bytecode::{ComponentInstance, Key, Program, SlotId};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A top-level host node of a mounted program, or a slot whose own nodes
/// sit at the top level (a ternary branch or a nested component)
#[derive(Debug, Clone)]
pub(crate) enum RootRef<N> {
    Host(N),
    Slot(SlotId),
}

/// A program bound to the host subtree it mounted
pub(crate) struct BytecodeNode<N> {
    pub program: Program,
    pub roots: Vec<RootRef<N>>,
    pub slots: Vec<Slot<N>>,
}

impl<N: Clone> BytecodeNode<N> {
    pub fn new(program: Program) -> Self {
        let slots = (0..program.slot_count()).map(|_| Slot::Empty).collect();
        Self {
            program,
            roots: Vec::new(),
            slots,
        }
    }

    /// Top-level host nodes in document order
    pub fn collect_roots(&self, out: &mut Vec<N>) {
        for root in &self.roots {
            match root {
                RootRef::Host(node) => out.push(node.clone()),
                RootRef::Slot(slot) => match &self.slots[*slot] {
                    Slot::Ternary(ternary) => ternary.collect_roots(out),
                    Slot::Component(component) => component.node.borrow().collect_roots(out),
                    _ => {}
                },
            }
        }
    }

    pub fn roots(&self) -> Vec<N> {
        let mut out = Vec::new();
        self.collect_roots(&mut out);
        out
    }

    pub fn first_root(&self) -> Option<N> {
        self.roots().into_iter().next()
    }
}

/// Per-instance storage for one slot id
pub(crate) enum Slot<N> {
    Empty,
    /// Dynamic property, attribute or text and the value last written
    Leaf { handle: N, value: Value },
    /// Element a delegated handler is registered on
    Event { handle: N },
    Ternary(TernarySlot<N>),
    Loop(LoopSlot<N>),
    Component(ComponentSlot<N>),
}

pub(crate) struct TernarySlot<N> {
    pub decision: bool,
    pub branch: Box<BytecodeNode<N>>,
    /// Empty text node holding the position of a branch without host nodes
    pub marker: Option<N>,
    pub parent: N,
}

impl<N: Clone> TernarySlot<N> {
    pub fn collect_roots(&self, out: &mut Vec<N>) {
        match &self.marker {
            Some(marker) => out.push(marker.clone()),
            None => self.branch.collect_roots(out),
        }
    }
}

pub(crate) struct LoopItem<N> {
    pub key: Key,
    pub props: Value,
    pub node: BytecodeNode<N>,
}

pub(crate) struct LoopSlot<N> {
    /// Element the items are children of
    pub parent: N,
    pub items: Vec<LoopItem<N>>,
}

pub(crate) struct ComponentSlot<N> {
    pub instance: Rc<ComponentInstance>,
    pub node: Rc<RefCell<BytecodeNode<N>>>,
}
