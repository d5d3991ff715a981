use super::Pass;
use crate::error::Result;
use crate::host::Host;
use crate::node::{BytecodeNode, Slot};
use bytedom_bytecode::UnmountOp;
use tracing::trace;

impl<'p, H: Host> Pass<'p, H> {
    /// Run the node's unmount program: release delegated handlers and tear
    /// down nested branches, loop items and components. Host nodes are left
    /// in place; callers detach the subtree roots.
    pub fn unmount(&mut self, node: &mut BytecodeNode<H::Node>) -> Result<()> {
        let program = node.program.clone();
        let plan = match program.plan() {
            Some(plan) => plan,
            None => return Ok(()),
        };

        for op in plan.unmount() {
            match op {
                UnmountOp::ReleaseEvent { name, slot } => {
                    if let Some(Slot::Event { handle }) = node.slots.get(*slot) {
                        self.events.release(name, handle);
                    }
                }
                UnmountOp::Ternary { slot } => {
                    if let Some(Slot::Ternary(ternary)) = node.slots.get_mut(*slot) {
                        self.unmount(&mut ternary.branch)?;
                    }
                }
                UnmountOp::Loop { slot } => {
                    if let Some(Slot::Loop(list)) = node.slots.get_mut(*slot) {
                        for item in &mut list.items {
                            self.unmount(&mut item.node)?;
                        }
                    }
                }
                UnmountOp::Component { slot } => {
                    if let Some(Slot::Component(component)) = node.slots.get(*slot) {
                        let id = component.instance.id();
                        component.instance.mark_unmounted();
                        self.components.remove(id);
                        let child = component.node.clone();
                        self.unmount(&mut child.borrow_mut())?;
                        trace!("Unmounted component {}", id);
                    }
                }
            }
        }
        Ok(())
    }
}
