//! Structural diff between two snapshots.

use std::collections::BTreeSet;

use mockbase_path::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::{ChildKey, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One leaf-level change.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: Path,
    pub kind: ChangeKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Leaf-level changes between two snapshots, in ascending path order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    changes: Vec<Change>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Whether any change lies at, below or above `path`.
    pub fn touches(&self, path: &Path) -> bool {
        self.changes
            .iter()
            .any(|c| path.contains(&c.path) || c.path.contains(path))
    }

    /// Keys of the immediate children of `path` that have changes below them,
    /// in key order.
    pub fn touched_children(&self, path: &Path) -> Vec<String> {
        let keys: BTreeSet<ChildKey> = self
            .changes
            .iter()
            .filter_map(|c| c.path.relative_to(path)?.first())
            .map(|k| ChildKey::from(k.as_str()))
            .collect();
        keys.into_iter().map(|k| k.as_str().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Compute the leaf-level changes turning `old` into `new`.
///
/// A subtree present on only one side adds or removes every leaf under it.
/// Shared or deeply equal subtrees produce nothing, so diffing a tree against
/// an equal one is empty.
///
/// # Example
///
/// ```
/// use mockbase::{diff, ChangeKind, Snapshot};
/// use serde_json::json;
///
/// let old = Snapshot::from_value(&json!({"a": 1, "b": 2})).unwrap();
/// let new = Snapshot::from_value(&json!({"a": 1, "c": 3})).unwrap();
/// let kinds: Vec<(String, ChangeKind)> = diff(&old, &new)
///     .iter()
///     .map(|c| (c.path.to_string(), c.kind))
///     .collect();
/// assert_eq!(kinds, vec![
///     ("/b".to_string(), ChangeKind::Removed),
///     ("/c".to_string(), ChangeKind::Added),
/// ]);
/// ```
pub fn diff(old: &Snapshot, new: &Snapshot) -> Diff {
    let mut changes = Vec::new();
    diff_at(&mut changes, &Path::root(), old, new);
    Diff { changes }
}

fn diff_at(changes: &mut Vec<Change>, path: &Path, old: &Snapshot, new: &Snapshot) {
    if old.ptr_eq(new) || old == new {
        return;
    }
    match (old, new) {
        (Snapshot::Leaf(a), Snapshot::Leaf(b)) => changes.push(Change {
            path: path.clone(),
            kind: ChangeKind::Changed,
            old: Some(a.clone()),
            new: Some(b.clone()),
        }),
        (Snapshot::Branch(a), Snapshot::Branch(b)) => {
            let keys: BTreeSet<&ChildKey> = a.keys().chain(b.keys()).collect();
            let empty = Snapshot::empty();
            for key in keys {
                diff_at(
                    changes,
                    &path.with_key(key.as_str()),
                    a.get(key).unwrap_or(&empty),
                    b.get(key).unwrap_or(&empty),
                );
            }
        }
        _ => {
            leaves(old, path, &mut |p, v| {
                changes.push(Change {
                    path: p,
                    kind: ChangeKind::Removed,
                    old: Some(v.clone()),
                    new: None,
                })
            });
            leaves(new, path, &mut |p, v| {
                changes.push(Change {
                    path: p,
                    kind: ChangeKind::Added,
                    old: None,
                    new: Some(v.clone()),
                })
            });
        }
    }
}

fn leaves(node: &Snapshot, path: &Path, visit: &mut dyn FnMut(Path, &Value)) {
    match node {
        Snapshot::Leaf(value) => visit(path.clone(), value),
        Snapshot::Branch(children) => {
            for (key, child) in children.iter() {
                leaves(child, &path.with_key(key.as_str()), visit);
            }
        }
    }
}
