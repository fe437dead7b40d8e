#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use mockbase::{Event, EventType, ManualClock, MockContext, MockOptions, Node};
use serde_json::Value;

/// What a listener saw: event kind, node key, value and previous sibling key.
pub type Seen = (EventType, Option<String>, Value, Option<String>);

pub type Log = Rc<RefCell<Vec<Seen>>>;

/// A listener callback appending every event to the returned log.
pub fn recorder() -> (Log, impl FnMut(&Event) + 'static) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let callback = record_into(&log);
    (log, callback)
}

/// A listener callback appending to an existing log.
pub fn record_into(log: &Log) -> impl FnMut(&Event) + 'static {
    let sink = Rc::clone(log);
    move |event: &Event| {
        sink.borrow_mut().push((
            event.kind,
            event.key().map(str::to_string),
            event.val().clone(),
            event.prev_key.clone(),
        ));
    }
}

/// Values seen so far, dropping the other fields.
pub fn values(log: &Log) -> Vec<Value> {
    log.borrow().iter().map(|(_, _, v, _)| v.clone()).collect()
}

/// A context with a fixed seed and a manual clock, plus the root of `mock://db`.
pub fn fixture(now_millis: i64) -> (MockContext, Rc<ManualClock>, Node) {
    let clock = Rc::new(ManualClock::new(now_millis));
    let ctx = MockContext::with_options(MockOptions::default().seed(11).clock(clock.clone()));
    let root = ctx.reference(Some("mock://db")).unwrap();
    (ctx, clock, root)
}
