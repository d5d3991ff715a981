//! In-memory document used by tests and benchmarks

use super::Host;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle into a [`MemoryHost`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One recorded host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    Append { parent: NodeId, child: NodeId },
    Insert { parent: NodeId, child: NodeId, before: Option<NodeId> },
    /// Insert or append of a node that was already attached
    Move { parent: NodeId, child: NodeId, before: Option<NodeId> },
    Remove { parent: NodeId, child: NodeId },
    SetAttribute { node: NodeId, name: String, value: String },
    SetClassName { node: NodeId, value: String },
    SetStyle { node: NodeId, value: String },
    SetTextContent { node: NodeId, value: String },
    AddListener { container: NodeId, event: String },
    RemoveListener { container: NodeId, event: String },
}

impl HostOp {
    /// Writes to an existing node's content
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            HostOp::SetAttribute { .. }
                | HostOp::SetClassName { .. }
                | HostOp::SetStyle { .. }
                | HostOp::SetTextContent { .. }
        )
    }
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        class_name: Option<String>,
        style: Option<String>,
        attributes: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document with an operation log
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<NodeData>,
    ops: Vec<HostOp>,
    listeners: FxHashMap<NodeId, IndexSet<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Create a detached element to render into. Not recorded in the log.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            class_name: None,
            style: None,
            attributes: IndexMap::new(),
        })
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        let moved = self.node(child).parent.is_some();
        self.detach(child);
        let siblings = &self.node(parent).children;
        let index = before
            .and_then(|reference| siblings.iter().position(|c| *c == reference))
            .unwrap_or(siblings.len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);

        let op = if moved {
            HostOp::Move { parent, child, before }
        } else if before.is_some() {
            HostOp::Insert { parent, child, before }
        } else {
            HostOp::Append { parent, child }
        };
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn move_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, HostOp::Move { .. })).count()
    }

    pub fn write_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_write()).count()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn class_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { class_name, .. } => class_name.as_deref(),
            NodeKind::Text(_) => None,
        }
    }

    pub fn style(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { style, .. } => style.as_deref(),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.node(node).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &self.node(node).children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Serialize the children of `node`
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.node(node).children {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialize `node` and its subtree
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.node(node).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element {
                tag,
                class_name,
                style,
                attributes,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
                if let Some(class_name) = class_name {
                    out.push_str(&format!(" class=\"{}\"", class_name));
                }
                if let Some(style) = style {
                    out.push_str(&format!(" style=\"{}\"", style));
                }
                out.push('>');
                for child in &self.node(node).children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// First element under `root` (inclusive) whose `id` attribute matches
    pub fn query_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        if self.attribute(root, "id") == Some(id) {
            return Some(root);
        }
        self.node(root)
            .children
            .iter()
            .find_map(|child| self.query_id(*child, id))
    }

    /// Elements under `root` (exclusive) with the given tag, in document order
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(root, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, node: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for child in &self.node(node).children {
            if self.tag(*child) == Some(tag) {
                found.push(*child);
            }
            self.collect_by_tag(*child, tag, found);
        }
    }

    /// Native listeners attached to `container`
    pub fn listeners(&self, container: NodeId) -> Vec<&str> {
        self.listeners
            .get(&container)
            .map(|events| events.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, container: NodeId) -> usize {
        self.listeners.get(&container).map_or(0, IndexSet::len)
    }
}

impl Host for MemoryHost {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.create_container(tag);
        self.ops.push(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        let node = self.alloc(NodeKind::Text(text.to_string()));
        self.ops.push(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        self.attach(*parent, *child, reference.copied());
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.node(*child).parent == Some(*parent) {
            self.detach(*child);
        }
        self.ops.push(HostOp::Remove {
            parent: *parent,
            child: *child,
        });
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(*node).kind {
            attributes.insert(name.to_string(), value.to_string());
        }
        self.ops.push(HostOp::SetAttribute {
            node: *node,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_class_name(&mut self, node: &NodeId, value: &str) {
        if let NodeKind::Element { class_name, .. } = &mut self.node_mut(*node).kind {
            *class_name = Some(value.to_string());
        }
        self.ops.push(HostOp::SetClassName {
            node: *node,
            value: value.to_string(),
        });
    }

    fn set_style(&mut self, node: &NodeId, css: &str) {
        if let NodeKind::Element { style, .. } = &mut self.node_mut(*node).kind {
            *style = Some(css.to_string());
        }
        self.ops.push(HostOp::SetStyle {
            node: *node,
            value: css.to_string(),
        });
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        let id = *node;
        if let NodeKind::Text(current) = &mut self.node_mut(id).kind {
            *current = text.to_string();
        } else {
            let children = std::mem::take(&mut self.node_mut(id).children);
            for child in children {
                self.node_mut(child).parent = None;
            }
            if !text.is_empty() {
                let child = self.alloc(NodeKind::Text(text.to_string()));
                self.node_mut(child).parent = Some(id);
                self.node_mut(id).children.push(child);
            }
        }
        self.ops.push(HostOp::SetTextContent {
            node: id,
            value: text.to_string(),
        });
    }

    fn add_event_listener(&mut self, container: &NodeId, event: &str) {
        self.listeners
            .entry(*container)
            .or_default()
            .insert(event.to_string());
        self.ops.push(HostOp::AddListener {
            container: *container,
            event: event.to_string(),
        });
    }

    fn remove_event_listener(&mut self, container: &NodeId, event: &str) {
        if let Some(events) = self.listeners.get_mut(container) {
            events.shift_remove(event);
        }
        self.ops.push(HostOp::RemoveListener {
            container: *container,
            event: event.to_string(),
        });
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).parent
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.node(*node).parent?;
        let siblings = &self.node(parent).children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }
}
