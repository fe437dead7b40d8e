//! Immutable data trees.
//!
//! A [`Snapshot`] is the whole content of one endpoint at one instant. Writes
//! never mutate a snapshot: [`Snapshot::with`] copies the branches along the
//! written path and shares every other subtree with the previous tree, so old
//! snapshots stay valid for diffing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mockbase_path::{validate_key, Path, PathError};
use mockbase_util::key_cmp;
use serde_json::{Map, Value};

/// A child key, ordered with [`key_cmp`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildKey(String);

impl ChildKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ChildKey {
    fn cmp(&self, other: &Self) -> Ordering {
        key_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for ChildKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for ChildKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ChildKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Children = BTreeMap<ChildKey, Snapshot>;

/// Persistent data tree.
///
/// Leaves hold booleans, numbers and strings. Branches never contain empty
/// children: `null` and `{}` mean "absent" and are pruned when a tree is
/// built or written.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Leaf(Value),
    Branch(Rc<Children>),
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Snapshot {
    /// The absent value.
    pub fn empty() -> Self {
        Self::Branch(Rc::new(BTreeMap::new()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Branch(children) if children.is_empty())
    }

    /// Build a tree from plain JSON.
    ///
    /// Objects become branches, arrays become branches keyed by index, and
    /// `null` members are dropped.
    ///
    /// # Errors
    ///
    /// Any object key that is not a valid path segment: empty, longer than
    /// 768 bytes or containing `/`.
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase::{PathError, Snapshot};
    /// use serde_json::json;
    ///
    /// let snap = Snapshot::from_value(&json!({"b": 2, "a": {"x": null}, "list": ["p", "q"]})).unwrap();
    /// assert_eq!(snap.to_value(), json!({"b": 2, "list": {"0": "p", "1": "q"}}));
    /// assert!(Snapshot::from_value(&json!({})).unwrap().is_empty());
    /// assert_eq!(Snapshot::from_value(&json!({"": 1})), Err(PathError::EmptyPath));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, PathError> {
        let tree = match value {
            Value::Null => Self::empty(),
            Value::Object(map) => Self::branch_from(map.iter().map(
                |(k, v)| -> Result<_, PathError> {
                    validate_key(k)?;
                    Ok((ChildKey::from(k.as_str()), Self::from_value(v)?))
                },
            ))?,
            Value::Array(items) => Self::branch_from(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| -> Result<_, PathError> {
                        Ok((ChildKey::from(i.to_string()), Self::from_value(v)?))
                    }),
            )?,
            scalar => Self::Leaf(scalar.clone()),
        };
        Ok(tree)
    }

    fn branch_from(
        children: impl Iterator<Item = Result<(ChildKey, Snapshot), PathError>>,
    ) -> Result<Self, PathError> {
        let mut branch = Children::new();
        for child in children {
            let (key, value) = child?;
            if !value.is_empty() {
                branch.insert(key, value);
            }
        }
        Ok(Self::Branch(Rc::new(branch)))
    }

    /// Number of segments from this node down to its deepest leaf.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Branch(children) => children
                .values()
                .map(|child| child.depth() + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// Materialize as plain JSON with keys in key order. Absent is `null`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Leaf(value) => value.clone(),
            Self::Branch(children) if children.is_empty() => Value::Null,
            Self::Branch(children) => {
                let mut map = Map::with_capacity(children.len());
                for (key, child) in children.iter() {
                    map.insert(key.0.clone(), child.to_value());
                }
                Value::Object(map)
            }
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            Self::Branch(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    pub fn child(&self, key: &str) -> Option<&Snapshot> {
        self.children()?.get(&ChildKey::from(key))
    }

    /// The node at `path`, or `None` when nothing is stored there.
    pub fn get(&self, path: &Path) -> Option<&Snapshot> {
        let mut node = self;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        (!node.is_empty()).then_some(node)
    }

    /// Plain JSON at `path`; `null` when absent.
    pub fn value_at(&self, path: &Path) -> Value {
        self.get(path).map_or(Value::Null, Snapshot::to_value)
    }

    /// A new tree with the node at `path` replaced by `value`.
    ///
    /// Branches along the path are copied, everything else is shared. Leaves
    /// on the way are replaced by branches and branches left empty by the
    /// write are pruned.
    pub fn with(&self, path: &Path, value: Snapshot) -> Snapshot {
        self.with_segments(path.segments(), value)
    }

    fn with_segments(&self, segments: &[String], value: Snapshot) -> Snapshot {
        let Some((head, rest)) = segments.split_first() else {
            return value;
        };
        let mut children = match self {
            Self::Branch(children) => Children::clone(children),
            Self::Leaf(_) => Children::new(),
        };
        let key = ChildKey::from(head.as_str());
        let next = match children.get(&key) {
            Some(existing) => existing.with_segments(rest, value),
            None => Snapshot::empty().with_segments(rest, value),
        };
        if next.is_empty() {
            children.remove(&key);
        } else {
            children.insert(key, next);
        }
        Self::Branch(Rc::new(children))
    }

    /// Key of the child ordered right before `key`, if any.
    pub fn prev_key(&self, key: &str) -> Option<String> {
        let children = self.children()?;
        children
            .range(..ChildKey::from(key))
            .next_back()
            .map(|(k, _)| k.0.clone())
    }

    /// Whether both trees are the same shared branch.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        match (self, other) {
            (Self::Branch(a), Self::Branch(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
