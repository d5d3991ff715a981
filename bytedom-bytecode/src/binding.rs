//! Callback signatures carried as operands by wire programs.
//!
//! Every function operand is evaluated against a [`Scope`]: the component
//! instance that owns the program (if any) and the props in effect, which are
//! the component's props, the root props, or a loop item's projected props.

use crate::component::ComponentInstance;
use crate::error::InvalidKey;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Evaluation context handed to binding functions
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    instance: Option<&'a ComponentInstance>,
    props: &'a Value,
}

impl<'a> Scope<'a> {
    pub fn new(instance: Option<&'a ComponentInstance>, props: &'a Value) -> Self {
        Self { instance, props }
    }

    /// Props in effect for this evaluation
    pub fn props(&self) -> &'a Value {
        self.props
    }

    /// Owning component instance, `None` for programs mounted directly on a root
    pub fn instance(&self) -> Option<&'a ComponentInstance> {
        self.instance
    }

    /// Read the owning component's state. Programs without a component see `null`.
    pub fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match self.instance {
            Some(instance) => f(&instance.state()),
            None => f(&Value::Null),
        }
    }

    /// Clone a single state field, `null` when absent
    pub fn state_field(&self, name: &str) -> Value {
        self.with_state(|state| state.get(name).cloned().unwrap_or(Value::Null))
    }
}

/// Stable per-item identity within one loop collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl TryFrom<&Value> for Key {
    type Error = InvalidKey;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Key::Int)
                .ok_or_else(|| InvalidKey(value.to_string())),
            Value::String(s) => Ok(Key::from(s.as_str())),
            other => Err(InvalidKey(other.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// A native event delivered to delegated handlers
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub detail: Value,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Computes a dynamic property, attribute or text value
pub type ComputeFn = Rc<dyn Fn(&Scope<'_>) -> anyhow::Result<Value>>;

/// Ternary test
pub type TestFn = Rc<dyn Fn(&Scope<'_>) -> anyhow::Result<bool>>;

/// Produces the collection a loop maps over
pub type CollectionFn = Rc<dyn Fn(&Scope<'_>) -> anyhow::Result<Vec<Value>>>;

/// Projects `(item, index)` to the item's key
pub type KeyFn = Rc<dyn Fn(&Scope<'_>, &Value, usize) -> anyhow::Result<Key>>;

/// Projects `(item, index)` to the item's props
pub type PropsFn = Rc<dyn Fn(&Scope<'_>, &Value, usize) -> anyhow::Result<Value>>;

/// `(previous props, next props)` -> whether a matched item is patched
pub type ShouldUpdateFn = Rc<dyn Fn(&Scope<'_>, &Value, &Value) -> bool>;

/// Produces a component's initial state from its props
pub type FactoryFn = Rc<dyn Fn(&Value) -> anyhow::Result<Value>>;

/// did-mount / did-update hook
pub type LifecycleFn = Rc<dyn Fn(Option<&ComponentInstance>) -> anyhow::Result<()>>;

/// Delegated event handler
pub type HandlerFn = Rc<dyn Fn(&Scope<'_>, &Event) -> anyhow::Result<()>>;
