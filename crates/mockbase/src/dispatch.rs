//! Decides which listeners a change reaches and with what payload.
//!
//! Planning is pure: it reads the registry and the two snapshots and returns
//! [`Delivery`] values. The endpoint turns each one into a deferred task that
//! re-checks the listener is still registered when it finally runs.

use mockbase_path::Path;
use serde_json::Value;

use crate::diff::Diff;
use crate::events::EventType;
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::snapshot::Snapshot;

/// A scheduled listener invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub listener: ListenerId,
    pub kind: EventType,
    /// Node the delivered data belongs to.
    pub path: Path,
    pub value: Value,
    pub prev_key: Option<String>,
}

/// Deliveries caused by replacing `old` with `new`.
///
/// Listeners still waiting for their initial delivery are skipped; that
/// delivery reads the data at flush time and already covers this change.
/// The result is ordered by delivered path, then by registration order.
pub fn plan_changes(
    registry: &ListenerRegistry,
    diff: &Diff,
    old: &Snapshot,
    new: &Snapshot,
) -> Vec<Delivery> {
    let mut out = Vec::new();
    if diff.is_empty() {
        return out;
    }
    for listener in registry.iter().filter(|l| !l.is_pending()) {
        let at = &listener.path;
        if listener.kind == EventType::Value {
            if diff.touches(at) && old.get(at) != new.get(at) {
                out.push(Delivery {
                    listener: listener.id,
                    kind: EventType::Value,
                    path: at.clone(),
                    value: new.value_at(at),
                    prev_key: None,
                });
            }
            continue;
        }
        for key in diff.touched_children(at) {
            let child = at.with_key(&key);
            let (kind, source) = match (old.get(&child), new.get(&child)) {
                (None, Some(_)) => (EventType::ChildAdded, new),
                (Some(_), None) => (EventType::ChildRemoved, old),
                (Some(a), Some(b)) if a != b => (EventType::ChildChanged, new),
                _ => continue,
            };
            if kind != listener.kind {
                continue;
            }
            out.push(Delivery {
                listener: listener.id,
                kind,
                value: source.value_at(&child),
                prev_key: source.get(at).and_then(|parent| parent.prev_key(&key)),
                path: child,
            });
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path).then(a.listener.cmp(&b.listener)));
    out
}

/// The registration-time delivery of a listener, read from `current`.
///
/// `value` listeners get the current value (null when absent);
/// `child_added` listeners get one delivery per existing child in key order.
pub fn plan_initial(
    listener: ListenerId,
    kind: EventType,
    path: &Path,
    current: &Snapshot,
) -> Vec<Delivery> {
    match kind {
        EventType::Value => vec![Delivery {
            listener,
            kind,
            path: path.clone(),
            value: current.value_at(path),
            prev_key: None,
        }],
        EventType::ChildAdded => {
            let Some(children) = current.get(path).and_then(Snapshot::children) else {
                return Vec::new();
            };
            let mut prev_key = None;
            children
                .iter()
                .map(|(key, child)| Delivery {
                    listener,
                    kind,
                    path: path.with_key(key.as_str()),
                    value: child.to_value(),
                    prev_key: prev_key.replace(key.as_str().to_string()),
                })
                .collect()
        }
        EventType::ChildChanged | EventType::ChildRemoved => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use serde_json::json;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn snap(v: Value) -> Snapshot {
        Snapshot::from_value(&v).unwrap()
    }

    fn registry(listeners: &[(&str, EventType)]) -> (ListenerRegistry, Vec<ListenerId>) {
        let mut reg = ListenerRegistry::new();
        let ids = listeners
            .iter()
            .map(|(path, kind)| {
                let id = reg.register(p(path), *kind, Box::new(|_| {}), None);
                reg.mark_delivered(id);
                id
            })
            .collect();
        (reg, ids)
    }

    fn plan(reg: &ListenerRegistry, old: Value, new: Value) -> Vec<Delivery> {
        let (old, new) = (snap(old), snap(new));
        plan_changes(reg, &diff(&old, &new), &old, &new)
    }

    #[test]
    fn test_value_listeners_on_changed_paths() {
        let (reg, ids) = registry(&[
            ("/", EventType::Value),
            ("/a", EventType::Value),
            ("/b", EventType::Value),
            ("/c", EventType::Value),
        ]);
        let got = plan(&reg, json!({"a": 1, "b": 2}), json!({"a": 1, "c": 3}));
        let fired: Vec<(ListenerId, Value)> =
            got.iter().map(|d| (d.listener, d.value.clone())).collect();
        assert_eq!(
            fired,
            vec![
                (ids[0], json!({"a": 1, "c": 3})),
                (ids[2], Value::Null),
                (ids[3], json!(3)),
            ]
        );
    }

    #[test]
    fn test_value_listener_fires_once_per_write() {
        let (reg, _) = registry(&[("/", EventType::Value)]);
        let got = plan(&reg, json!({}), json!({"a": 1, "b": 2, "c": {"d": 3}}));
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn test_value_listener_below_replaced_leaf_is_quiet() {
        let (reg, _) = registry(&[("/a/b", EventType::Value)]);
        assert!(plan(&reg, json!({"a": 1}), json!({"a": 2})).is_empty());
    }

    #[test]
    fn test_child_events() {
        let (reg, ids) = registry(&[
            ("/", EventType::ChildAdded),
            ("/", EventType::ChildChanged),
            ("/", EventType::ChildRemoved),
        ]);
        let got = plan(
            &reg,
            json!({"a": 1, "b": {"x": 1}, "c": 3}),
            json!({"a": 1, "b": {"x": 2}, "d": 4}),
        );
        let summary: Vec<(ListenerId, EventType, String, Option<String>)> = got
            .iter()
            .map(|d| (d.listener, d.kind, d.path.to_string(), d.prev_key.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ids[1], EventType::ChildChanged, "/b".into(), Some("a".into())),
                (ids[2], EventType::ChildRemoved, "/c".into(), Some("b".into())),
                (ids[0], EventType::ChildAdded, "/d".into(), Some("b".into())),
            ]
        );
        assert_eq!(got[0].value, json!({"x": 2}));
        assert_eq!(got[1].value, json!(3));
    }

    #[test]
    fn test_sorted_by_path_then_registration() {
        let (reg, ids) = registry(&[
            ("/b", EventType::Value),
            ("/a", EventType::Value),
            ("/a", EventType::Value),
        ]);
        let got = plan(&reg, json!({}), json!({"a": 1, "b": 1}));
        let order: Vec<ListenerId> = got.iter().map(|d| d.listener).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_pending_listeners_skipped() {
        let mut reg = ListenerRegistry::new();
        reg.register(Path::root(), EventType::Value, Box::new(|_| {}), None);
        assert!(plan(&reg, json!({}), json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_no_op_write_plans_nothing() {
        let (reg, _) = registry(&[("/", EventType::Value), ("/", EventType::ChildChanged)]);
        assert!(plan(&reg, json!({"a": {"b": 1}}), json!({"a": {"b": 1}})).is_empty());
    }

    #[test]
    fn test_initial_value_and_children() {
        let current = snap(json!({"list": {"x": 1, "y": 2}}));
        let (_, ids) = registry(&[("/", EventType::Value)]);
        let id = ids[0];

        let value = plan_initial(id, EventType::Value, &p("/missing"), &current);
        assert_eq!(value.len(), 1);
        assert_eq!(value[0].value, Value::Null);

        let added = plan_initial(id, EventType::ChildAdded, &p("/list"), &current);
        let keys: Vec<(String, Option<String>)> = added
            .iter()
            .map(|d| (d.path.to_string(), d.prev_key.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("/list/x".to_string(), None),
                ("/list/y".to_string(), Some("x".to_string())),
            ]
        );
        assert!(plan_initial(id, EventType::ChildRemoved, &p("/list"), &current).is_empty());
    }
}
