//! bytedom runtime
//!
//! Executes decoded bytedom programs against a [`Host`] document:
//!
//! - the mount pass walks a program once, creating host nodes, filling the
//!   node's slots and deriving the program's update/unmount plan
//! - the update pass replays the plan, writing only values that changed
//! - loops are reconciled by key, moving the fewest nodes the longest
//!   increasing subsequence allows
//! - events are delegated: one native listener per event name per root,
//!   dispatched by walking from the target up to the container
//! - `set_state` only enqueues; [`Runtime::flush`] drains the queue in order
//!   and then runs deferred callbacks last-in first-out

pub mod config;
pub mod error;
mod events;
mod fiber;
pub mod host;
mod interpreter;
mod node;
mod queue;
pub mod reconcile;
mod runtime;

pub use bytedom_bytecode as bytecode;
pub use config::{DuplicateKeyPolicy, RuntimeBuilder, RuntimeConfig};
pub use error::{RenderError, Result};
pub use fiber::RootElement;
pub use host::{Host, HostOp, MemoryHost, NodeId};
pub use reconcile::longest_increasing_subsequence;
pub use runtime::Runtime;
