//! Deterministic in-memory double of a hierarchical realtime database client.
//!
//! Data lives in endpoints (one logical database per `scheme://host`). A
//! [`Node`] addresses one path of one endpoint and can read, write and
//! listen. Writes update the data immediately but every notification is
//! queued, and nothing reaches a listener until a test calls
//! [`Node::flush`]:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use mockbase::{EventType, MockContext};
//! use serde_json::{json, Value};
//!
//! let ctx = MockContext::new();
//! let users = ctx.reference(Some("mock://db/users")).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::<Value>::new()));
//! let sink = seen.clone();
//! users.on(EventType::Value, move |event| sink.borrow_mut().push(event.val().clone()));
//!
//! users.child("ada").unwrap().set(&json!({"born": 1815})).unwrap();
//! assert!(seen.borrow().is_empty());
//!
//! users.flush().unwrap();
//! assert_eq!(*seen.borrow(), vec![json!({"ada": {"born": 1815}})]);
//! ```

pub mod clock;
pub mod context;
pub mod diff;
pub mod dispatch;
mod endpoint;
pub mod error;
pub mod events;
pub mod listeners;
pub mod node;
pub mod queue;
pub mod server_value;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{MockContext, MockOptions};
pub use diff::{diff, Change, ChangeKind, Diff};
pub use error::MockError;
pub use events::{DataSnapshot, Event, EventType};
pub use listeners::ListenerId;
pub use node::{ChildNode, Node, RootNode};
pub use queue::DeferredQueue;
pub use server_value::{resolve_server_values, ServerValue};
pub use snapshot::Snapshot;

pub use mockbase_path::{Path, PathError, Url};
