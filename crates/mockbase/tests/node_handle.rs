mod common;

use common::{fixture, recorder, values};
use mockbase::{
    ChangeKind, EventType, ManualClock, MockContext, MockError, MockOptions, PathError, ServerValue,
};
use serde_json::{json, Map, Value};
use std::rc::Rc;

#[test]
fn test_path_navigation() {
    let (_ctx, _clock, root) = fixture(0);
    let c = root.child("a/b/c").unwrap();
    assert_eq!(c.to_string(), "mock://db/a/b/c");
    assert_eq!(c.parent().unwrap().key(), Some("b"));
    assert_eq!(c.root(), root);
    assert!(root.parent().is_none());
    assert_eq!(root.key(), None);
    assert_eq!(root.to_string(), "mock://db/");
    assert!(root.child("a/..").unwrap().is_root());
    assert_eq!(c.child("../d").unwrap().to_string(), "mock://db/a/b/d");
    assert_eq!(c.url().path().to_string(), "/a/b/c");
    assert_eq!(c.reference(), c);
}

#[test]
fn test_invalid_child_paths() {
    let (_ctx, _clock, root) = fixture(0);
    assert!(matches!(root.child(""), Err(MockError::InvalidArgument(_))));
    let deep = vec!["k"; 33].join("/");
    assert!(matches!(root.child(&deep), Err(MockError::InvalidArgument(_))));
    let long = "x".repeat(769);
    assert!(matches!(root.child(&long), Err(MockError::InvalidArgument(_))));
}

#[test]
fn test_set_data_only_on_root() {
    let (_ctx, _clock, root) = fixture(0);
    let child = root.child("a").unwrap();
    assert!(matches!(
        child.set_data(&json!(1)),
        Err(MockError::NotRoot("set_data"))
    ));
    root.set_data(&json!({"a": 1, "b": 2})).unwrap();
    root.set_data(&json!({"c": 3})).unwrap();
    assert_eq!(root.get_data(), json!({"c": 3}));
}

#[test]
fn test_write_diff_reports_leaf_changes() {
    let (_ctx, _clock, root) = fixture(0);
    root.set_data(&json!({"a": 1, "b": 2})).unwrap();
    let diff = root.set_data(&json!({"a": 1, "c": 3})).unwrap();
    let changes: Vec<(String, ChangeKind, Option<Value>, Option<Value>)> = diff
        .iter()
        .map(|c| (c.path.to_string(), c.kind, c.old.clone(), c.new.clone()))
        .collect();
    assert_eq!(
        changes,
        vec![
            ("/b".to_string(), ChangeKind::Removed, Some(json!(2)), None),
            ("/c".to_string(), ChangeKind::Added, None, Some(json!(3))),
        ]
    );
}

#[test]
fn test_equal_write_is_a_no_op() {
    let (_ctx, _clock, root) = fixture(0);
    let (log, callback) = recorder();
    root.on(EventType::Value, callback);
    root.flush().unwrap();

    let data = json!({"a": {"b": [1, 2]}, "c": "x"});
    assert!(!root.set(&data).unwrap().is_empty());
    root.flush().unwrap();
    assert!(root.set(&data).unwrap().is_empty());
    assert!(root.child("c").unwrap().set(&json!("x")).unwrap().is_empty());
    assert_eq!(root.queued(), 0);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_null_and_empty_objects_are_absent() {
    let (_ctx, _clock, root) = fixture(0);
    root.set(&json!({"a": {"b": 1}, "e": {}, "n": null})).unwrap();
    assert_eq!(root.get_data(), json!({"a": {"b": 1}}));
    root.child("a/b").unwrap().remove();
    assert_eq!(root.get_data(), Value::Null);
    assert_eq!(root.child("a").unwrap().get_data(), Value::Null);
}

#[test]
fn test_arrays_are_stored_by_index() {
    let (_ctx, _clock, root) = fixture(0);
    root.child("list").unwrap().set(&json!(["x", "y"])).unwrap();
    assert_eq!(root.child("list/1").unwrap().get_data(), json!("y"));
    assert_eq!(root.get_data(), json!({"list": {"0": "x", "1": "y"}}));
}

#[test]
fn test_numeric_keys_sort_first() {
    let (_ctx, _clock, root) = fixture(0);
    root.set(&json!({"b": 1, "10": 1, "a": 1, "9": 1})).unwrap();
    let keys: Vec<String> = root
        .get_data()
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, vec!["9", "10", "a", "b"]);
}

#[test]
fn test_update_merges_in_one_change() {
    let (_ctx, _clock, root) = fixture(0);
    root.set(&json!({"c": 1, "keep": true})).unwrap();
    let (log, callback) = recorder();
    root.on(EventType::Value, callback);
    root.flush().unwrap();

    let mut patch = Map::new();
    patch.insert("a/b".to_string(), json!(1));
    patch.insert("c".to_string(), Value::Null);
    root.update(&patch).unwrap();
    root.flush().unwrap();
    assert_eq!(root.get_data(), json!({"a": {"b": 1}, "keep": true}));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_update_with_invalid_key_writes_nothing() {
    let (_ctx, _clock, root) = fixture(0);
    let mut patch = Map::new();
    patch.insert("ok".to_string(), json!(1));
    patch.insert(String::new(), json!(2));
    assert!(matches!(
        root.update(&patch),
        Err(MockError::InvalidArgument(_))
    ));
    assert_eq!(root.get_data(), Value::Null);
}

#[test]
fn test_written_values_must_have_valid_keys() {
    let (_ctx, _clock, root) = fixture(0);
    let (log, callback) = recorder();
    root.on(EventType::Value, callback);
    root.flush().unwrap();

    let mut long_key = Map::new();
    long_key.insert("x".repeat(769), json!(3));
    for bad in [
        json!({"a/b": 1}),
        json!({"": 2}),
        json!({"ok": {"nested/slash": true}}),
        Value::Object(long_key),
    ] {
        assert!(matches!(root.set(&bad), Err(MockError::InvalidArgument(_))));
        assert!(matches!(root.set_data(&bad), Err(MockError::InvalidArgument(_))));
        assert!(matches!(root.push(&bad), Err(MockError::InvalidArgument(_))));
    }
    assert!(matches!(
        root.set(&json!({"a/b": 1})),
        Err(MockError::InvalidArgument(PathError::SlashInKey(key))) if key == "a/b"
    ));

    let mut patch = Map::new();
    patch.insert("ok".to_string(), json!(1));
    patch.insert("nested".to_string(), json!({"": 2}));
    assert!(matches!(
        root.update(&patch),
        Err(MockError::InvalidArgument(PathError::EmptyPath))
    ));

    assert_eq!(root.get_data(), Value::Null);
    assert_eq!(root.queued(), 0);
    assert_eq!(values(&log), vec![Value::Null]);
}

#[test]
fn test_written_values_must_fit_max_depth() {
    let (_ctx, _clock, root) = fixture(0);
    let deep = root.child(&vec!["k"; 32].join("/")).unwrap();
    deep.set(&json!(1)).unwrap();
    assert_eq!(deep.get_data(), json!(1));
    assert!(matches!(
        deep.set(&json!({"x": {"y": 1}})),
        Err(MockError::InvalidArgument(PathError::TooDeep { depth: 34 }))
    ));
    assert_eq!(deep.get_data(), json!(1));

    let shallower = deep.parent().unwrap();
    shallower.set(&json!({"x": 2})).unwrap();
    assert_eq!(shallower.child("x").unwrap().get_data(), json!(2));
    assert!(matches!(
        shallower.set(&json!({"x": {"y": 1}})),
        Err(MockError::InvalidArgument(PathError::TooDeep { depth: 33 }))
    ));

    let mut patch = Map::new();
    patch.insert("z".to_string(), json!({"too": "deep"}));
    assert!(matches!(
        shallower.update(&patch),
        Err(MockError::InvalidArgument(PathError::TooDeep { depth: 33 }))
    ));
    assert_eq!(shallower.get_data(), json!({"k": 1, "x": 2}));
}

#[test]
fn test_server_timestamp_uses_injected_clock() {
    let (_ctx, clock, root) = fixture(1_234);
    let node = root.child("meta").unwrap();
    node.set(&json!({"created": ServerValue::timestamp()})).unwrap();
    clock.advance(6);
    node.child("updated")
        .unwrap()
        .set(&ServerValue::timestamp())
        .unwrap();
    assert_eq!(node.get_data(), json!({"created": 1_234, "updated": 1_240}));
}

#[test]
fn test_push_ids_are_chronological() {
    let (_ctx, clock, root) = fixture(1_000);
    let list = root.child("list").unwrap();
    let first = list.push(&json!("a")).unwrap();
    let second = list.push(&json!("b")).unwrap();
    clock.advance(1);
    let third = list.push(&Value::Null).unwrap();

    let keys = [
        first.key().unwrap(),
        second.key().unwrap(),
        third.key().unwrap(),
    ];
    assert!(keys.iter().all(|k| k.len() == 20));
    assert!(keys[0] < keys[1] && keys[1] < keys[2]);
    assert_eq!(first.parent().unwrap(), list);
    assert_eq!(list.get_data().as_object().map(Map::len), Some(2));
    assert_eq!(third.get_data(), Value::Null);
}

#[test]
fn test_seeded_contexts_are_reproducible() {
    let run = || {
        let clock = Rc::new(ManualClock::new(99));
        let ctx = MockContext::with_options(MockOptions::default().seed(5).clock(clock));
        let root = ctx.reference(None).unwrap();
        let pushed = root.push(&json!(1)).unwrap();
        (root.to_string(), pushed.to_string())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_handles_compare_by_endpoint_and_path() {
    let ctx = MockContext::new();
    let a = ctx.reference(Some("mock://db/x")).unwrap();
    let b = ctx.reference(Some("mock://db")).unwrap().child("x").unwrap();
    let other = ctx.reference(Some("mock://other/x")).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, other);
    assert_eq!(a.path(), other.path());
    assert!(!a.same_endpoint(&other));
}

#[test]
fn test_listener_on_child_sees_parent_writes() {
    let (_ctx, _clock, root) = fixture(0);
    let (log, callback) = recorder();
    root.child("a/b").unwrap().on(EventType::Value, callback);
    root.flush().unwrap();
    root.set(&json!({"a": {"b": 1, "c": 2}})).unwrap();
    root.set(&json!({"a": {"b": 1, "c": 3}})).unwrap();
    root.set(&json!({"a": 5})).unwrap();
    root.flush().unwrap();
    assert_eq!(values(&log), vec![Value::Null, json!(1), Value::Null]);
}
