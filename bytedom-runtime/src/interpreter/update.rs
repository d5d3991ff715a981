use super::{render_value, resolve, write_property, Env, Pass, Target};
use crate::error::{RenderError, Result};
use crate::host::Host;
use crate::node::{BytecodeNode, Slot};
use crate::queue::Deferred;
use bytedom_bytecode::instruction::{SlotId, TernarySpec};
use bytedom_bytecode::{ComponentInstance, Opcode, UpdateOp};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Store `value` in a leaf slot. Returns the handle and text to write when
/// the value changed, `None` when the write can be skipped.
fn refresh_leaf<N: Clone>(
    slots: &mut [Slot<N>],
    slot: SlotId,
    value: Value,
) -> Result<Option<(N, String)>> {
    match slots.get_mut(slot) {
        Some(Slot::Leaf {
            handle,
            value: last,
        }) => {
            if *last == value {
                return Ok(None);
            }
            let text = render_value(&value).into_owned();
            *last = value;
            Ok(Some((handle.clone(), text)))
        }
        _ => Err(RenderError::SlotMismatch {
            slot,
            expected: "value",
        }),
    }
}

impl<'p, H: Host> Pass<'p, H> {
    /// Run the node's update program. Host writes are issued only for
    /// values that differ from the ones stored in the slots.
    pub fn update(&mut self, node: &mut BytecodeNode<H::Node>, env: Env<'_>) -> Result<()> {
        let program = node.program.clone();
        let plan = match program.plan() {
            Some(plan) => plan,
            None => return Ok(()),
        };

        for op in plan.update() {
            match op {
                UpdateOp::Property {
                    property,
                    binding,
                    slot,
                } => {
                    let value = resolve(binding, op.opcode(), env, &node.slots)?;
                    if let Some((handle, text)) = refresh_leaf(&mut node.slots, *slot, value)? {
                        write_property(self.host, &handle, *property, &text);
                    }
                }
                UpdateOp::Attribute {
                    name,
                    binding,
                    slot,
                } => {
                    let value = resolve(binding, op.opcode(), env, &node.slots)?;
                    if let Some((handle, text)) = refresh_leaf(&mut node.slots, *slot, value)? {
                        self.host.set_attribute(&handle, name, &text);
                    }
                }
                UpdateOp::Text {
                    opcode,
                    binding,
                    slot,
                } => {
                    let value = resolve(binding, *opcode, env, &node.slots)?;
                    if let Some((handle, text)) = refresh_leaf(&mut node.slots, *slot, value)? {
                        self.host.set_text_content(&handle, &text);
                    }
                }
                UpdateOp::Ternary(spec) => self.update_ternary(node, spec, env)?,
                UpdateOp::Loop(spec) => {
                    let slot = match node.slots.get_mut(spec.slot) {
                        Some(Slot::Loop(slot)) => slot,
                        _ => {
                            return Err(RenderError::SlotMismatch {
                                slot: spec.slot,
                                expected: "loop",
                            })
                        }
                    };
                    self.update_loop(spec, env, slot)?;
                }
                UpdateOp::Component { slot } => {
                    let (instance, child) = match node.slots.get(*slot) {
                        Some(Slot::Component(component)) => {
                            (component.instance.clone(), component.node.clone())
                        }
                        _ => {
                            return Err(RenderError::SlotMismatch {
                                slot: *slot,
                                expected: "component",
                            })
                        }
                    };
                    if *instance.props() != *env.props {
                        instance.replace_props(env.props.clone());
                    }
                    self.update_component(&instance, &child)?;
                }
                UpdateOp::DidUpdate(callback) => {
                    self.deferred.push(Deferred::Lifecycle {
                        context: "did-update",
                        callback: callback.clone(),
                        instance: env.instance.cloned(),
                    });
                }
                UpdateOp::RefreshEvent { name, slot, .. } => match node.slots.get(*slot) {
                    Some(Slot::Event { handle }) => {
                        self.events.refresh(name, handle, env.props.clone());
                    }
                    _ => {
                        return Err(RenderError::SlotMismatch {
                            slot: *slot,
                            expected: "event",
                        })
                    }
                },
            }
        }
        Ok(())
    }

    /// Re-render a component node against the instance's current props and state
    pub fn update_component(
        &mut self,
        instance: &Rc<ComponentInstance>,
        node: &Rc<RefCell<BytecodeNode<H::Node>>>,
    ) -> Result<()> {
        let props = instance.props();
        let env = Env {
            instance: Some(instance),
            props: &props,
        };
        let mut node = node.borrow_mut();
        self.update(&mut node, env)
    }

    fn update_ternary(
        &mut self,
        node: &mut BytecodeNode<H::Node>,
        spec: &TernarySpec,
        env: Env<'_>,
    ) -> Result<()> {
        let decision = (spec.test)(&env.scope()).map_err(RenderError::binding(Opcode::Ternary))?;
        let ternary = match node.slots.get_mut(spec.slot) {
            Some(Slot::Ternary(ternary)) => ternary,
            _ => {
                return Err(RenderError::SlotMismatch {
                    slot: spec.slot,
                    expected: "ternary",
                })
            }
        };

        if decision == ternary.decision {
            return self.update(&mut ternary.branch, env);
        }
        if !self.config.rebranch_ternaries {
            debug!(
                "Ternary test flipped to {} but branch re-selection is disabled",
                decision
            );
            return self.update(&mut ternary.branch, env);
        }

        let mut old_roots = Vec::new();
        ternary.collect_roots(&mut old_roots);
        let anchor = old_roots
            .last()
            .and_then(|last| self.host.next_sibling(last));

        self.unmount(&mut ternary.branch)?;
        let parent = ternary.parent.clone();
        self.remove_nodes(&parent, &old_roots);

        let program = if decision {
            &spec.consequent
        } else {
            &spec.alternate
        };
        let position = Target { parent, anchor };
        let (branch, marker) = self.mount_branch(program, env, &position)?;
        ternary.branch = Box::new(branch);
        ternary.marker = marker;
        ternary.decision = decision;
        debug!("Ternary re-branched to {}", if decision { "consequent" } else { "alternate" });
        Ok(())
    }
}
