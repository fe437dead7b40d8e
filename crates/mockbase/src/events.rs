use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MockError;
use crate::node::Node;

/// Kinds of listener events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Value,
    ChildAdded,
    ChildChanged,
    ChildRemoved,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Value,
        EventType::ChildAdded,
        EventType::ChildChanged,
        EventType::ChildRemoved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Value => "value",
            EventType::ChildAdded => "child_added",
            EventType::ChildChanged => "child_changed",
            EventType::ChildRemoved => "child_removed",
        }
    }

    /// Whether a listener of this kind gets an initial delivery on the next
    /// flush after it is registered.
    pub fn fires_on_register(self) -> bool {
        matches!(self, EventType::Value | EventType::ChildAdded)
    }
}

impl FromStr for EventType {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| MockError::UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data at one node, as delivered to a listener.
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    node: Node,
    value: Value,
}

impl DataSnapshot {
    pub fn new(node: Node, value: Value) -> Self {
        Self { node, value }
    }

    /// The node this data was read from.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn key(&self) -> Option<&str> {
        self.node.key()
    }

    /// Plain JSON; `null` when absent.
    pub fn val(&self) -> &Value {
        &self.value
    }

    pub fn into_val(self) -> Value {
        self.value
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Data at a descendant path.
    pub fn child(&self, path: &str) -> Result<DataSnapshot, MockError> {
        let node = self.node.child(path)?;
        let value = node
            .path()
            .relative_to(self.node.path())
            .and_then(|rel| {
                rel.iter()
                    .try_fold(&self.value, |v, segment| v.get(segment.as_str()))
            })
            .cloned()
            .unwrap_or(Value::Null);
        Ok(DataSnapshot::new(node, value))
    }

    pub fn has_child(&self, key: &str) -> bool {
        self.value.get(key).is_some()
    }

    pub fn has_children(&self) -> bool {
        self.num_children() > 0
    }

    pub fn num_children(&self) -> usize {
        self.value.as_object().map_or(0, |m| m.len())
    }
}

/// One listener invocation.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventType,
    pub snapshot: DataSnapshot,
    /// Key of the preceding sibling, for child events.
    pub prev_key: Option<String>,
}

impl Event {
    pub fn key(&self) -> Option<&str> {
        self.snapshot.key()
    }

    pub fn val(&self) -> &Value {
        self.snapshot.val()
    }
}
