//! Component instances and the state update queue.
//!
//! `set_state` never touches state directly: it appends a [`QueuedUpdate`] to
//! the runtime's [`UpdateQueue`]. The runtime drains the queue in FIFO order,
//! merges each partial state and re-runs the owning component's update program.

use serde_json::{Map, Value};
use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Identity of a mounted component instance within one runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback run once the update pass for a `set_state` call has completed
pub type StateCallback = Box<dyn FnOnce(&ComponentInstance) -> anyhow::Result<()>>;

/// Computes a partial state from `(current state, props)`
pub type StateUpdater = Box<dyn FnOnce(&Value, &Value) -> anyhow::Result<Value>>;

/// The argument of `set_state`
pub enum StateUpdate {
    /// Fields to merge into the current state
    Partial(Value),
    /// Function of the state at the time the entry is applied
    Updater(StateUpdater),
}

impl StateUpdate {
    pub fn updater<F>(f: F) -> Self
    where
        F: FnOnce(&Value, &Value) -> anyhow::Result<Value> + 'static,
    {
        StateUpdate::Updater(Box::new(f))
    }

    /// Resolve to the partial state to merge
    pub fn resolve(self, state: &Value, props: &Value) -> anyhow::Result<Value> {
        match self {
            StateUpdate::Partial(partial) => Ok(partial),
            StateUpdate::Updater(f) => f(state, props),
        }
    }
}

impl From<Value> for StateUpdate {
    fn from(partial: Value) -> Self {
        StateUpdate::Partial(partial)
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Partial(partial) => f.debug_tuple("Partial").field(partial).finish(),
            StateUpdate::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// Shallow merge: a new object holding `state`'s fields overwritten by `partial`'s.
/// A non-object on either side means `partial` replaces the state outright.
pub fn merge_state(state: &Value, partial: Value) -> Value {
    match (state, partial) {
        (Value::Object(current), Value::Object(fields)) => {
            let mut merged: Map<String, Value> = current.clone();
            for (name, value) in fields {
                merged.insert(name, value);
            }
            Value::Object(merged)
        }
        (_, partial) => partial,
    }
}

/// One pending `set_state` call
pub struct QueuedUpdate {
    pub target: InstanceId,
    pub update: StateUpdate,
    pub callback: Option<StateCallback>,
}

impl fmt::Debug for QueuedUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedUpdate")
            .field("target", &self.target)
            .field("update", &self.update)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// FIFO of pending state updates, shared by every instance of one runtime
#[derive(Clone, Default)]
pub struct UpdateQueue {
    entries: Rc<RefCell<VecDeque<QueuedUpdate>>>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: QueuedUpdate) {
        self.entries.borrow_mut().push_back(entry);
    }

    pub fn pop(&self) -> Option<QueuedUpdate> {
        self.entries.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue").field("len", &self.len()).finish()
    }
}

/// A mounted component: props, state and a bound `set_state`
pub struct ComponentInstance {
    id: InstanceId,
    props: RefCell<Value>,
    state: RefCell<Value>,
    mounted: Cell<bool>,
    queue: UpdateQueue,
}

impl ComponentInstance {
    pub fn new(id: InstanceId, props: Value, state: Value, queue: UpdateQueue) -> Self {
        Self {
            id,
            props: RefCell::new(props),
            state: RefCell::new(state),
            mounted: Cell::new(true),
            queue,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn props(&self) -> Ref<'_, Value> {
        self.props.borrow()
    }

    pub fn state(&self) -> Ref<'_, Value> {
        self.state.borrow()
    }

    /// Enqueue a state change; applied on the next flush
    pub fn set_state(&self, update: impl Into<StateUpdate>) {
        self.enqueue(update.into(), None);
    }

    /// Enqueue a state change and a callback run after its update pass
    pub fn set_state_with<F>(&self, update: impl Into<StateUpdate>, callback: F)
    where
        F: FnOnce(&ComponentInstance) -> anyhow::Result<()> + 'static,
    {
        self.enqueue(update.into(), Some(Box::new(callback)));
    }

    fn enqueue(&self, update: StateUpdate, callback: Option<StateCallback>) {
        self.queue.push(QueuedUpdate {
            target: self.id,
            update,
            callback,
        });
    }

    /// Replace props. Called by the runtime when a parent pass re-renders this component.
    pub fn replace_props(&self, props: Value) {
        *self.props.borrow_mut() = props;
    }

    /// Replace state. Called by the runtime while draining the update queue.
    pub fn replace_state(&self, state: Value) {
        *self.state.borrow_mut() = state;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn mark_unmounted(&self) {
        self.mounted.set(false);
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("props", &*self.props.borrow())
            .field("state", &*self.state.borrow())
            .field("mounted", &self.mounted.get())
            .finish()
    }
}
