//! Mount, update and unmount passes.
//!
//! A [`Pass`] borrows everything one interpreter run may touch: the host,
//! the delegated event tables of the fiber being rendered, the runtime's
//! component registry and the pass-local list of deferred callbacks.

mod mount;
mod unmount;
mod update;

use crate::config::RuntimeConfig;
use crate::error::{RenderError, Result};
use crate::fiber::{ComponentRegistry, EventTables};
use crate::host::Host;
use crate::node::Slot;
use crate::queue::Deferred;
use bytedom_bytecode::{Binding, ComponentInstance, Opcode, Property, Scope, UpdateQueue};
use serde_json::Value;
use std::borrow::Cow;
use std::rc::Rc;

pub(crate) struct Pass<'p, H: Host> {
    pub host: &'p mut H,
    pub events: &'p mut EventTables<H::Node>,
    pub components: &'p mut ComponentRegistry<H::Node>,
    pub deferred: &'p mut Vec<Deferred>,
    pub queue: &'p UpdateQueue,
    pub config: &'p RuntimeConfig,
}

/// Owning component and props a program is evaluated against
#[derive(Clone, Copy)]
pub(crate) struct Env<'e> {
    pub instance: Option<&'e Rc<ComponentInstance>>,
    pub props: &'e Value,
}

impl<'e> Env<'e> {
    pub fn root(props: &'e Value) -> Self {
        Self {
            instance: None,
            props,
        }
    }

    pub fn scope(&self) -> Scope<'e> {
        Scope::new(self.instance.map(|instance| &**instance), self.props)
    }

    /// Same owner, different props
    pub fn with_props<'a>(&self, props: &'a Value) -> Env<'a>
    where
        'e: 'a,
    {
        Env {
            instance: self.instance,
            props,
        }
    }
}

/// Where top-level nodes of a mount go
#[derive(Debug, Clone)]
pub(crate) struct Target<N> {
    pub parent: N,
    /// Insert before this node, or append when `None`
    pub anchor: Option<N>,
}

impl<N> Target<N> {
    pub fn append(parent: N) -> Self {
        Self {
            parent,
            anchor: None,
        }
    }
}

impl<'p, H: Host> Pass<'p, H> {
    pub fn insert_nodes(&mut self, parent: &H::Node, nodes: &[H::Node], anchor: Option<&H::Node>) {
        for node in nodes {
            self.host.insert_before(parent, node, anchor);
        }
    }

    pub fn remove_nodes(&mut self, parent: &H::Node, nodes: &[H::Node]) {
        for node in nodes {
            self.host.remove_child(parent, node);
        }
    }
}

/// Evaluate a dynamic binding
pub(crate) fn resolve<N>(
    binding: &Binding,
    opcode: Opcode,
    env: Env<'_>,
    slots: &[Slot<N>],
) -> Result<Value> {
    match binding {
        Binding::Compute(f) => f(&env.scope()).map_err(RenderError::binding(opcode)),
        Binding::Prop(name) => Ok(env.props.get(&**name).cloned().unwrap_or(Value::Null)),
        Binding::Sibling(slot) => match slots.get(*slot) {
            Some(Slot::Leaf { value, .. }) => Ok(value.clone()),
            _ => Err(RenderError::SlotMismatch {
                slot: *slot,
                expected: "value",
            }),
        },
    }
}

/// Text form of a value written to the host
pub(crate) fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

pub(crate) fn write_property<H: Host>(
    host: &mut H,
    node: &H::Node,
    property: Property,
    text: &str,
) {
    match property {
        Property::ClassName => host.set_class_name(node, text),
        Property::Id => host.set_attribute(node, "id", text),
        Property::Style => host.set_style(node, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_resolve_prop_and_sibling() {
        let props = json!({"label": "hi"});
        let env = Env::root(&props);
        let slots: Vec<Slot<u32>> = vec![Slot::Leaf {
            handle: 7,
            value: json!("cached"),
        }];

        let from_prop = |name: &str| {
            resolve(
                &Binding::Prop(Rc::from(name)),
                Opcode::TextDynamicNodeFromSlot,
                env,
                &slots,
            )
        };
        assert_eq!(from_prop("label").unwrap(), json!("hi"));
        assert_eq!(from_prop("missing").unwrap(), Value::Null);
        let value =
            resolve(&Binding::Sibling(0), Opcode::AttributeDynamicFromSlot, env, &slots).unwrap();
        assert_eq!(value, json!("cached"));
        assert!(matches!(
            resolve(&Binding::Sibling(3), Opcode::AttributeDynamicFromSlot, env, &slots),
            Err(RenderError::SlotMismatch { slot: 3, .. })
        ));
    }
}
