//! Root records: fibers, delegated event tables and the component registry.

use crate::host::Host;
use crate::node::BytecodeNode;
use bytedom_bytecode::binding::HandlerFn;
use bytedom_bytecode::{ComponentInstance, InstanceId, Program};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use tracing::debug;

/// What `render` mounts: a program and the props it is evaluated against
#[derive(Debug, Clone)]
pub struct RootElement {
    pub program: Program,
    pub props: Value,
}

impl RootElement {
    pub fn new(program: Program, props: Value) -> Self {
        Self { program, props }
    }
}

/// One delegated handler, keyed by the element it was bound on
#[derive(Clone)]
pub(crate) struct Registration {
    pub handler: HandlerFn,
    pub props: Value,
    pub instance: Option<Rc<ComponentInstance>>,
}

/// event name -> element -> registration, for one root container
pub(crate) struct EventTables<N> {
    container: N,
    tables: FxHashMap<Rc<str>, FxHashMap<N, Registration>>,
}

impl<N: Clone + Eq + Hash> EventTables<N> {
    pub fn new(container: N) -> Self {
        Self {
            container,
            tables: FxHashMap::default(),
        }
    }

    pub fn container(&self) -> &N {
        &self.container
    }

    /// Register a handler, attaching the native listener the first time an
    /// event name is seen on this root
    pub fn register<H>(
        &mut self,
        host: &mut H,
        name: &Rc<str>,
        handle: N,
        registration: Registration,
    ) where
        H: Host<Node = N>,
    {
        if !self.tables.contains_key(name) {
            debug!("Attaching native '{}' listener", name);
            host.add_event_listener(&self.container, name);
            self.tables.insert(name.clone(), FxHashMap::default());
        }
        if let Some(table) = self.tables.get_mut(name) {
            table.insert(handle, registration);
        }
    }

    /// Replace an existing registration's props
    pub fn refresh(&mut self, name: &str, handle: &N, props: Value) {
        if let Some(registration) = self
            .tables
            .get_mut(name)
            .and_then(|table| table.get_mut(handle))
        {
            registration.props = props;
        }
    }

    pub fn release(&mut self, name: &str, handle: &N) -> bool {
        self.tables
            .get_mut(name)
            .map_or(false, |table| table.remove(handle).is_some())
    }

    pub fn lookup(&self, name: &str, handle: &N) -> Option<&Registration> {
        self.tables.get(name)?.get(handle)
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.tables.get(name).map_or(0, |table| table.len())
    }

    pub fn total_handlers(&self) -> usize {
        self.tables.values().map(|table| table.len()).sum()
    }

    /// Event names with a native listener attached
    pub fn listener_count(&self) -> usize {
        self.tables.len()
    }

    /// Remove every native listener and registration
    pub fn detach_all<H>(&mut self, host: &mut H)
    where
        H: Host<Node = N>,
    {
        for name in self.tables.keys() {
            host.remove_event_listener(&self.container, name);
        }
        self.tables.clear();
    }
}

pub(crate) struct ComponentEntry<N> {
    pub instance: Rc<ComponentInstance>,
    pub node: Weak<RefCell<BytecodeNode<N>>>,
    pub container: N,
}

/// Mounted component instances of one runtime, by id
pub(crate) struct ComponentRegistry<N> {
    next_id: u64,
    entries: FxHashMap<InstanceId, ComponentEntry<N>>,
}

impl<N> ComponentRegistry<N> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: FxHashMap::default(),
        }
    }

    pub fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, entry: ComponentEntry<N>) {
        self.entries.insert(entry.instance.id(), entry);
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<ComponentEntry<N>> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&ComponentEntry<N>> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A program mounted into one container
pub(crate) struct Fiber<N> {
    pub props: Value,
    pub node: BytecodeNode<N>,
    pub events: EventTables<N>,
}

impl<N: Clone> Fiber<N> {
    pub fn program(&self) -> &Program {
        &self.node.program
    }
}
