//! Instruction tree for script execution.
//!
//! A parsed script is a tree of [`Node`] values. Each node has a name, an
//! optional JSON-typed value, and an ordered list of children. Slots receive
//! a mutable node as their invocation payload and may rewrite it in place;
//! whatever the slot leaves behind is the result of the invocation.
//!
//! The tree is a plain data structure. Execution semantics (what a given
//! node name means) belong to the slots registered in the dispatch registry,
//! not to this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single node in an instruction tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name. For the root of a parsed script this is the empty string.
    pub name: String,

    /// Optional value attached to the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Ordered child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node with a name and no value or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a node with a name and value.
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Append a child node, returning `self` for chaining.
    pub fn add(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child node in place.
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable reference to the first child with the given name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Set the value of the first child with the given name, creating the
    /// child if it does not exist.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        match self.get_mut(name) {
            Some(child) => child.value = Some(value.into()),
            None => self.children.push(Node::with_value(name, value)),
        }
    }

    /// Remove the first child with the given name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let idx = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(idx))
    }

    /// The node's value as a string slice, if it is a JSON string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    /// The node's value as a u16, if it is a JSON number in range.
    pub fn value_u16(&self) -> Option<u16> {
        self.value
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|n| u16::try_from(n).ok())
    }

    /// The node's value as a bool, if it is a JSON boolean.
    pub fn value_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(Value::as_bool)
    }

    /// Convenience lookup: value of the first child with the given name,
    /// as a string slice.
    pub fn child_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Node::value_str)
    }
}
