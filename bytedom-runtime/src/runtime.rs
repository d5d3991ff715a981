//! The runtime context: root registry, component registry and update queue

use crate::config::{RuntimeBuilder, RuntimeConfig};
use crate::error::Result;
use crate::fiber::{ComponentRegistry, EventTables, Fiber, RootElement};
use crate::host::Host;
use crate::interpreter::{Env, Pass, Target};
use crate::queue::{run_deferred, Deferred};
use bytedom_bytecode::UpdateQueue;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Renders programs into containers of one host.
///
/// Owns everything that outlives a single pass: one fiber per mounted
/// container, the component registry and the shared update queue. Several
/// runtimes can coexist; they share nothing.
pub struct Runtime<H: Host> {
    pub(crate) host: H,
    pub(crate) config: RuntimeConfig,
    pub(crate) roots: FxHashMap<H::Node, Fiber<H::Node>>,
    pub(crate) components: ComponentRegistry<H::Node>,
    pub(crate) queue: UpdateQueue,
}

impl<H: Host> Runtime<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    pub fn with_config(host: H, config: RuntimeConfig) -> Self {
        Self {
            host,
            config,
            roots: FxHashMap::default(),
            components: ComponentRegistry::new(),
            queue: UpdateQueue::new(),
        }
    }

    pub fn builder(host: H) -> RuntimeBuilder<H> {
        RuntimeBuilder::new(host)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Mount, update or unmount the tree rendered into `container`.
    ///
    /// - no fiber yet: mount `tree`
    /// - same program as the mounted one: update with the new props
    /// - different program: unmount the old tree, mount the new one
    /// - `None`: unmount
    ///
    /// Deferred callbacks and queued state updates are settled before this
    /// returns.
    pub fn render(&mut self, tree: Option<RootElement>, container: &H::Node) -> Result<()> {
        let mut deferred = Vec::new();
        match tree {
            Some(tree) => {
                let same_program = self
                    .roots
                    .get(container)
                    .map(|fiber| fiber.program().ptr_eq(&tree.program));
                match same_program {
                    Some(true) => self.update_root(tree, container, &mut deferred)?,
                    Some(false) => {
                        self.unmount_root(container)?;
                        self.mount_root(tree, container, &mut deferred)?;
                    }
                    None => self.mount_root(tree, container, &mut deferred)?,
                }
            }
            None => self.unmount_root(container)?,
        }
        run_deferred(&mut deferred)?;
        self.flush()
    }

    fn mount_root(
        &mut self,
        tree: RootElement,
        container: &H::Node,
        deferred: &mut Vec<Deferred>,
    ) -> Result<()> {
        debug!("Mounting root into {:?}", container);
        let RootElement { program, props } = tree;
        let mut events = EventTables::new(container.clone());
        let node = {
            let mut pass = Pass {
                host: &mut self.host,
                events: &mut events,
                components: &mut self.components,
                deferred,
                queue: &self.queue,
                config: &self.config,
            };
            pass.mount(&program, Env::root(&props), &Target::append(container.clone()))?
        };
        self.roots
            .insert(container.clone(), Fiber { props, node, events });
        Ok(())
    }

    fn update_root(
        &mut self,
        tree: RootElement,
        container: &H::Node,
        deferred: &mut Vec<Deferred>,
    ) -> Result<()> {
        debug!("Updating root in {:?}", container);
        let fiber = match self.roots.get_mut(container) {
            Some(fiber) => fiber,
            None => return Ok(()),
        };
        fiber.props = tree.props;
        let mut pass = Pass {
            host: &mut self.host,
            events: &mut fiber.events,
            components: &mut self.components,
            deferred,
            queue: &self.queue,
            config: &self.config,
        };
        pass.update(&mut fiber.node, Env::root(&fiber.props))
    }

    /// Tear down the fiber of `container`, if there is one
    fn unmount_root(&mut self, container: &H::Node) -> Result<()> {
        let mut fiber = match self.roots.remove(container) {
            Some(fiber) => fiber,
            None => return Ok(()),
        };
        debug!(
            "Unmounting root from {:?} ({} delegated handler(s))",
            container,
            fiber.events.total_handlers()
        );
        let mut deferred = Vec::new();
        {
            let mut pass = Pass {
                host: &mut self.host,
                events: &mut fiber.events,
                components: &mut self.components,
                deferred: &mut deferred,
                queue: &self.queue,
                config: &self.config,
            };
            pass.unmount(&mut fiber.node)?;
            let roots = fiber.node.roots();
            pass.remove_nodes(container, &roots);
        }
        fiber.events.detach_all(&mut self.host);
        Ok(())
    }

    pub fn is_mounted(&self, container: &H::Node) -> bool {
        self.roots.contains_key(container)
    }

    /// Native listeners attached to `container`
    pub fn listener_count(&self, container: &H::Node) -> usize {
        self.roots
            .get(container)
            .map_or(0, |fiber| fiber.events.listener_count())
    }

    /// Delegated handlers registered for `event` under `container`
    pub fn handler_count(&self, container: &H::Node, event: &str) -> usize {
        self.roots
            .get(container)
            .map_or(0, |fiber| fiber.events.handler_count(event))
    }

    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    /// Mounted component instances across every root
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
