use super::{render_value, resolve, write_property, Env, Pass, Target};
use crate::error::{RenderError, Result};
use crate::fiber::{ComponentEntry, Registration};
use crate::host::Host;
use crate::node::{BytecodeNode, ComponentSlot, LoopSlot, RootRef, Slot, TernarySlot};
use crate::queue::Deferred;
use bytedom_bytecode::instruction::{ComponentSpec, Instruction};
use bytedom_bytecode::{ComponentInstance, Opcode, PlanBuilder, Program, UnmountOp, UpdateOp};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Innermost open element, skipping fragments
fn enclosing<N>(stack: &[Option<N>]) -> Option<&N> {
    stack.iter().rev().find_map(Option::as_ref)
}

fn current<N>(stack: &[Option<N>]) -> Result<&N> {
    match stack.last() {
        Some(Some(element)) => Ok(element),
        _ => Err(RenderError::Invariant {
            reason: "instruction requires an open element",
        }),
    }
}

impl<'p, H: Host> Pass<'p, H> {
    /// Mount `program`, placing its top-level nodes at `target`. The first
    /// mount of a program also derives and caches its update/unmount plan.
    pub fn mount(
        &mut self,
        program: &Program,
        env: Env<'_>,
        target: &Target<H::Node>,
    ) -> Result<BytecodeNode<H::Node>> {
        let mut plan = program.plan().is_none().then(PlanBuilder::new);
        let mut node = BytecodeNode::new(program.clone());
        // Some(element) for open elements, None for open fragments
        let mut stack: Vec<Option<H::Node>> = Vec::new();

        for instruction in program.instructions() {
            match instruction {
                Instruction::OpenElement(tag) => {
                    let element = self.host.create_element(tag.as_str());
                    stack.push(Some(element));
                }
                Instruction::CloseElement => {
                    let element = stack.pop().flatten().ok_or(RenderError::Invariant {
                        reason: "element close without an open element",
                    })?;
                    self.place(&stack, &mut node, target, element);
                }
                Instruction::OpenFragment => stack.push(None),
                Instruction::CloseFragment => {
                    stack.pop();
                }

                Instruction::StaticProperty { property, value } => {
                    write_property(self.host, current(&stack)?, *property, value);
                }
                Instruction::StaticAttribute { name, value } => {
                    self.host.set_attribute(current(&stack)?, name, value);
                }
                Instruction::StaticText(text) => {
                    self.host.set_text_content(current(&stack)?, text);
                }
                Instruction::StaticTextNode(text) => {
                    let text_node = self.host.create_text_node(text);
                    self.place(&stack, &mut node, target, text_node);
                }

                Instruction::DynamicProperty {
                    property,
                    binding,
                    slot,
                } => {
                    let handle = current(&stack)?.clone();
                    let value = resolve(binding, instruction.opcode(), env, &node.slots)?;
                    write_property(self.host, &handle, *property, &render_value(&value));
                    node.slots[*slot] = Slot::Leaf { handle, value };
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Property {
                            property: *property,
                            binding: binding.clone(),
                            slot: *slot,
                        });
                    }
                }
                Instruction::DynamicAttribute {
                    name,
                    binding,
                    slot,
                } => {
                    let handle = current(&stack)?.clone();
                    let value = resolve(binding, instruction.opcode(), env, &node.slots)?;
                    self.host.set_attribute(&handle, name, &render_value(&value));
                    node.slots[*slot] = Slot::Leaf { handle, value };
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Attribute {
                            name: name.clone(),
                            binding: binding.clone(),
                            slot: *slot,
                        });
                    }
                }
                Instruction::DynamicText { binding, slot } => {
                    let handle = current(&stack)?.clone();
                    let value = resolve(binding, Opcode::TextDynamicContent, env, &node.slots)?;
                    self.host.set_text_content(&handle, &render_value(&value));
                    node.slots[*slot] = Slot::Leaf { handle, value };
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Text {
                            opcode: Opcode::TextDynamicContent,
                            binding: binding.clone(),
                            slot: *slot,
                        });
                    }
                }
                Instruction::DynamicTextNode { binding, slot } => {
                    let opcode = instruction.opcode();
                    let value = resolve(binding, opcode, env, &node.slots)?;
                    let handle = self.host.create_text_node(&render_value(&value));
                    self.place(&stack, &mut node, target, handle.clone());
                    node.slots[*slot] = Slot::Leaf { handle, value };
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Text {
                            opcode,
                            binding: binding.clone(),
                            slot: *slot,
                        });
                    }
                }

                Instruction::Ternary(spec) => {
                    let decision = (spec.test)(&env.scope())
                        .map_err(RenderError::binding(Opcode::Ternary))?;
                    let (position, at_root) = position(&stack, target);
                    let program = if decision {
                        &spec.consequent
                    } else {
                        &spec.alternate
                    };
                    let (branch, marker) = self.mount_branch(program, env, &position)?;
                    node.slots[spec.slot] = Slot::Ternary(TernarySlot {
                        decision,
                        branch: Box::new(branch),
                        marker,
                        parent: position.parent,
                    });
                    if at_root {
                        node.roots.push(RootRef::Slot(spec.slot));
                    }
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Ternary(spec.clone()));
                        plan.push_unmount(UnmountOp::Ternary { slot: spec.slot });
                    }
                }
                Instruction::Loop(spec) => {
                    let parent = enclosing(&stack).cloned().ok_or(RenderError::Invariant {
                        reason: "loop outside an element",
                    })?;
                    let items = self.mount_loop(spec, env, &parent)?;
                    node.slots[spec.slot] = Slot::Loop(LoopSlot { parent, items });
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Loop(spec.clone()));
                        plan.push_unmount(UnmountOp::Loop { slot: spec.slot });
                    }
                }
                Instruction::Component(spec) => {
                    let (position, at_root) = position(&stack, target);
                    let component = self.mount_component(spec, env, &position)?;
                    node.slots[spec.slot] = Slot::Component(component);
                    if at_root {
                        node.roots.push(RootRef::Slot(spec.slot));
                    }
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::Component { slot: spec.slot });
                        plan.push_unmount(UnmountOp::Component { slot: spec.slot });
                    }
                }

                Instruction::DidMount(callback) => {
                    self.deferred.push(Deferred::Lifecycle {
                        context: "did-mount",
                        callback: callback.clone(),
                        instance: env.instance.cloned(),
                    });
                }
                Instruction::DidUpdate(callback) => {
                    if let Some(plan) = plan.as_mut() {
                        plan.push_update(UpdateOp::DidUpdate(callback.clone()));
                    }
                }

                Instruction::Event {
                    name,
                    handler,
                    slot,
                    refresh,
                } => {
                    let handle = current(&stack)?.clone();
                    let registration = Registration {
                        handler: handler.clone(),
                        props: env.props.clone(),
                        instance: env.instance.cloned(),
                    };
                    self.events
                        .register(self.host, name, handle.clone(), registration);
                    node.slots[*slot] = Slot::Event { handle };
                    if let Some(plan) = plan.as_mut() {
                        if *refresh {
                            plan.push_update(UpdateOp::RefreshEvent {
                                name: name.clone(),
                                handler: handler.clone(),
                                slot: *slot,
                            });
                        }
                        plan.push_unmount(UnmountOp::ReleaseEvent {
                            name: name.clone(),
                            slot: *slot,
                        });
                    }
                }
            }
        }

        if let Some(plan) = plan {
            let plan = program.install_plan(plan.finish());
            trace!(
                "Derived plan: {} update op(s), {} unmount op(s)",
                plan.update().len(),
                plan.unmount().len()
            );
        }
        Ok(node)
    }

    /// Attach a finished node to the innermost open element, or to the
    /// target when no element is open
    fn place(
        &mut self,
        stack: &[Option<H::Node>],
        node: &mut BytecodeNode<H::Node>,
        target: &Target<H::Node>,
        child: H::Node,
    ) {
        match enclosing(stack) {
            Some(parent) => self.host.append_child(parent, &child),
            None => {
                self.host
                    .insert_before(&target.parent, &child, target.anchor.as_ref());
                node.roots.push(RootRef::Host(child));
            }
        }
    }

    /// Mount a ternary branch. A branch without host nodes gets an empty
    /// text node to keep its position.
    pub(crate) fn mount_branch(
        &mut self,
        program: &Program,
        env: Env<'_>,
        position: &Target<H::Node>,
    ) -> Result<(BytecodeNode<H::Node>, Option<H::Node>)> {
        let branch = self.mount(program, env, position)?;
        if branch.first_root().is_some() {
            return Ok((branch, None));
        }
        let marker = self.host.create_text_node("");
        self.host
            .insert_before(&position.parent, &marker, position.anchor.as_ref());
        Ok((branch, Some(marker)))
    }

    fn mount_component(
        &mut self,
        spec: &ComponentSpec,
        env: Env<'_>,
        position: &Target<H::Node>,
    ) -> Result<ComponentSlot<H::Node>> {
        let props = env.props.clone();
        let state =
            (spec.factory)(&props).map_err(RenderError::binding(Opcode::ComponentInstance))?;
        let id = self.components.allocate_id();
        let instance = Rc::new(ComponentInstance::new(id, props, state, self.queue.clone()));

        let node = {
            let props = instance.props();
            let child_env = Env {
                instance: Some(&instance),
                props: &props,
            };
            self.mount(&spec.program, child_env, position)?
        };
        let node = Rc::new(RefCell::new(node));

        self.components.insert(ComponentEntry {
            instance: instance.clone(),
            node: Rc::downgrade(&node),
            container: self.events.container().clone(),
        });
        trace!("Mounted component {}", id);
        Ok(ComponentSlot { instance, node })
    }
}

/// Where a ternary or component at this point of the stack places its nodes,
/// and whether those nodes are top-level nodes of the program
fn position<N: Clone>(stack: &[Option<N>], target: &Target<N>) -> (Target<N>, bool) {
    match enclosing(stack) {
        Some(parent) => (Target::append(parent.clone()), false),
        None => (target.clone(), true),
    }
}
