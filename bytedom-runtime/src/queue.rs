//! Update queue flush and deferred callbacks.

use crate::error::{RenderError, Result};
use crate::host::Host;
use crate::interpreter::Pass;
use crate::runtime::Runtime;
use bytedom_bytecode::binding::LifecycleFn;
use bytedom_bytecode::{merge_state, ComponentInstance, QueuedUpdate, StateCallback};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Callback collected during a pass, run once the pass's host writes are done
pub(crate) enum Deferred {
    Lifecycle {
        context: &'static str,
        callback: LifecycleFn,
        instance: Option<Rc<ComponentInstance>>,
    },
    StateSettled {
        callback: StateCallback,
        instance: Rc<ComponentInstance>,
    },
}

/// Run deferred callbacks in reverse registration order
pub(crate) fn run_deferred(deferred: &mut Vec<Deferred>) -> Result<()> {
    if !deferred.is_empty() {
        trace!("Running {} deferred callback(s)", deferred.len());
    }
    while let Some(entry) = deferred.pop() {
        match entry {
            Deferred::Lifecycle {
                context,
                callback,
                instance,
            } => callback(instance.as_deref()).map_err(RenderError::callback(context))?,
            Deferred::StateSettled { callback, instance } => {
                callback(&instance).map_err(RenderError::callback("set_state callback"))?
            }
        }
    }
    Ok(())
}

impl<H: Host> Runtime<H> {
    /// Apply every queued state update and run the resulting deferred
    /// callbacks. Callbacks may enqueue further updates; those are handled in
    /// another round, up to `max_flush_rounds`.
    pub fn flush(&mut self) -> Result<()> {
        let mut rounds = 0;
        while !self.queue.is_empty() {
            if rounds == self.config.max_flush_rounds {
                return Err(RenderError::UpdateLoop { rounds });
            }
            rounds += 1;

            let mut deferred = Vec::new();
            let mut applied = 0;
            while let Some(entry) = self.queue.pop() {
                self.apply_update(entry, &mut deferred)?;
                applied += 1;
            }
            debug!("Flush round {}: applied {} update(s)", rounds, applied);
            run_deferred(&mut deferred)?;
        }
        Ok(())
    }

    fn apply_update(&mut self, entry: QueuedUpdate, deferred: &mut Vec<Deferred>) -> Result<()> {
        let QueuedUpdate {
            target,
            update,
            callback,
        } = entry;

        let (instance, node, container) = match self.components.get(target) {
            Some(component) if component.instance.is_mounted() => (
                component.instance.clone(),
                component.node.upgrade(),
                component.container.clone(),
            ),
            _ => {
                warn!("Skipping state update for unmounted component {}", target);
                return Ok(());
            }
        };
        let node = match node {
            Some(node) => node,
            None => {
                warn!("Skipping state update for component {} without a mounted node", target);
                return Ok(());
            }
        };

        let partial = {
            let state = instance.state();
            let props = instance.props();
            update
                .resolve(&state, &props)
                .map_err(RenderError::callback("state updater"))?
        };
        let next = merge_state(&instance.state(), partial);
        instance.replace_state(next);

        let fiber = self
            .roots
            .get_mut(&container)
            .ok_or(RenderError::UnknownRoot)?;
        let mut pass = Pass {
            host: &mut self.host,
            events: &mut fiber.events,
            components: &mut self.components,
            deferred: &mut *deferred,
            queue: &self.queue,
            config: &self.config,
        };
        pass.update_component(&instance, &node)?;

        if let Some(callback) = callback {
            deferred.push(Deferred::StateSettled { callback, instance });
        }
        Ok(())
    }
}
