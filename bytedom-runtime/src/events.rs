//! Delegated event dispatch

use crate::error::{RenderError, Result};
use crate::fiber::Registration;
use crate::host::Host;
use crate::runtime::Runtime;
use bytedom_bytecode::{Event, Scope};
use tracing::debug;

impl<H: Host> Runtime<H> {
    /// Deliver a native event that reached `container`'s listener.
    ///
    /// Walks from `target` up to (not including) the container and invokes
    /// every handler registered for `event.name` along the way, target first.
    /// The update queue is flushed afterwards. Returns the number of handlers
    /// invoked.
    pub fn dispatch_event(
        &mut self,
        container: &H::Node,
        target: &H::Node,
        event: &Event,
    ) -> Result<usize> {
        let fiber = self.roots.get(container).ok_or(RenderError::UnknownRoot)?;

        let mut path: Vec<Registration> = Vec::new();
        let mut cursor = Some(target.clone());
        while let Some(node) = cursor {
            if node == *container {
                break;
            }
            if let Some(registration) = fiber.events.lookup(&event.name, &node) {
                path.push(registration.clone());
            }
            cursor = self.host.parent_node(&node);
        }
        debug!("Dispatching '{}' to {} handler(s)", event.name, path.len());

        for registration in &path {
            let scope = Scope::new(registration.instance.as_deref(), &registration.props);
            (registration.handler)(&scope, event).map_err(RenderError::callback("event handler"))?;
        }
        self.flush()?;
        Ok(path.len())
    }
}
