//! Host platform binding.
//!
//! The interpreter only ever touches the document through [`Host`]. A browser
//! binding maps these calls onto the DOM; [`MemoryHost`] keeps an in-memory
//! tree and records every call for inspection.

mod memory;

pub use memory::{HostOp, MemoryHost, NodeId};

use std::fmt::Debug;
use std::hash::Hash;

/// Capabilities the runtime needs from a document tree
pub trait Host {
    /// Handle to an element or text node
    type Node: Clone + Eq + Hash + Debug;

    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn create_text_node(&mut self, text: &str) -> Self::Node;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    /// A child that is already attached somewhere is moved.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    );

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn set_class_name(&mut self, node: &Self::Node, value: &str);

    fn set_style(&mut self, node: &Self::Node, css: &str);

    /// Replace all children of an element, or the text of a text node
    fn set_text_content(&mut self, node: &Self::Node, text: &str);

    /// Attach the single native listener for `event` on a root container
    fn add_event_listener(&mut self, container: &Self::Node, event: &str);

    fn remove_event_listener(&mut self, container: &Self::Node, event: &str);

    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
}
