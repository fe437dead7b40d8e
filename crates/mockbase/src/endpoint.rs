//! One logical database: store, queue and listeners shared by every handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mockbase_path::{Path, PathError, MAX_PATH_DEPTH};
use mockbase_util::IdGenerator;
use serde_json::Value;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::diff::Diff;
use crate::dispatch::{plan_changes, plan_initial, Delivery};
use crate::error::MockError;
use crate::events::{DataSnapshot, Event, EventType};
use crate::listeners::{Callback, CancelCallback, ListenerId, ListenerRegistry};
use crate::node::{Node, RootNode};
use crate::queue::DeferredQueue;
use crate::server_value::resolve_server_values;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

pub(crate) struct Endpoint {
    name: String,
    store: RefCell<SnapshotStore>,
    queue: DeferredQueue,
    listeners: RefCell<ListenerRegistry>,
    clock: Rc<dyn Clock>,
    ids: Rc<RefCell<IdGenerator>>,
}

impl Endpoint {
    pub(crate) fn new(
        name: String,
        clock: Rc<dyn Clock>,
        ids: Rc<RefCell<IdGenerator>>,
    ) -> Rc<Self> {
        debug!(endpoint = %name, "endpoint created");
        Rc::new(Self {
            name,
            store: RefCell::new(SnapshotStore::new()),
            queue: DeferredQueue::new(),
            listeners: RefCell::new(ListenerRegistry::new()),
            clock,
            ids,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    pub(crate) fn read(&self, path: &Path) -> Value {
        self.store.borrow().read(path)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.store.borrow().snapshot().clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub(crate) fn next_push_id(&self) -> String {
        let now = self.now_millis();
        self.ids.borrow_mut().push_id(now)
    }

    /// Convert plain JSON to a tree for writing at `at`, resolving server
    /// values first. Keys are validated and the deepest leaf must stay
    /// within `MAX_PATH_DEPTH` segments of the root.
    pub(crate) fn prepare(&self, at: &Path, value: &Value) -> Result<Snapshot, MockError> {
        let tree = Snapshot::from_value(&resolve_server_values(value, self.now_millis()))?;
        let depth = at.len() + tree.depth();
        if depth > MAX_PATH_DEPTH {
            return Err(PathError::TooDeep { depth }.into());
        }
        Ok(tree)
    }

    /// Write several subtrees at once and schedule the resulting deliveries.
    pub(crate) fn write(self: &Rc<Self>, writes: Vec<(Path, Snapshot)>) -> Diff {
        let old = self.snapshot();
        let next = writes
            .into_iter()
            .fold(old.clone(), |tree, (path, value)| tree.with(&path, value));
        let diff = self.store.borrow_mut().write(next.clone());
        debug!(endpoint = %self.name, changes = diff.len(), "write applied");
        self.notify(&diff, &old, &next);
        diff
    }

    /// Defer one delivery per listener reached by `diff`.
    fn notify(self: &Rc<Self>, diff: &Diff, old: &Snapshot, new: &Snapshot) {
        if diff.is_empty() {
            return;
        }
        let deliveries = plan_changes(&self.listeners.borrow(), diff, old, new);
        if deliveries.is_empty() {
            return;
        }
        debug!(
            endpoint = %self.name,
            deliveries = deliveries.len(),
            "deliveries scheduled"
        );
        for delivery in deliveries {
            let weak = Rc::downgrade(self);
            self.queue.defer(move || match weak.upgrade() {
                Some(endpoint) => endpoint.deliver(delivery),
                None => Ok(()),
            });
        }
    }

    pub(crate) fn register(
        self: &Rc<Self>,
        path: Path,
        kind: EventType,
        callback: Callback,
        cancel: Option<CancelCallback>,
    ) -> ListenerId {
        let id = self
            .listeners
            .borrow_mut()
            .register(path, kind, callback, cancel);
        trace!(endpoint = %self.name, listener = %id, event = %kind, "listener registered");
        if kind.fires_on_register() {
            let weak = Rc::downgrade(self);
            self.queue.defer(move || match weak.upgrade() {
                Some(endpoint) => endpoint.deliver_initial(id),
                None => Ok(()),
            });
        }
        id
    }

    pub(crate) fn unregister(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().unregister(id).is_some()
    }

    pub(crate) fn unregister_matching(&self, path: &Path, kind: Option<EventType>) -> usize {
        self.listeners
            .borrow_mut()
            .unregister_matching(path, kind)
            .len()
    }

    /// Defer removing the matching listeners and calling their cancel
    /// callbacks with `error`.
    pub(crate) fn force_cancel(
        self: &Rc<Self>,
        path: Path,
        kind: Option<EventType>,
        error: MockError,
    ) {
        let weak = Rc::downgrade(self);
        self.queue.defer(move || {
            let Some(endpoint) = weak.upgrade() else {
                return Ok(());
            };
            let removed = endpoint
                .listeners
                .borrow_mut()
                .unregister_matching(&path, kind);
            debug!(
                endpoint = %endpoint.name,
                path = %path,
                cancelled = removed.len(),
                "listeners cancelled"
            );
            for mut listener in removed {
                if let Some(cancel) = listener.take_cancel() {
                    cancel(&error);
                }
            }
            Ok(())
        });
    }

    fn deliver_initial(self: &Rc<Self>, id: ListenerId) -> Result<(), MockError> {
        let (kind, path) = match self.listeners.borrow().get(id) {
            Some(listener) => (listener.kind, listener.path.clone()),
            None => {
                trace!(listener = %id, "initial delivery skipped, listener removed");
                return Ok(());
            }
        };
        self.listeners.borrow_mut().mark_delivered(id);
        let current = self.snapshot();
        for delivery in plan_initial(id, kind, &path, &current) {
            self.deliver(delivery)?;
        }
        Ok(())
    }

    fn deliver(self: &Rc<Self>, delivery: Delivery) -> Result<(), MockError> {
        let cell = match self.listeners.borrow().get(delivery.listener) {
            Some(listener) => listener.callback(),
            None => {
                trace!(listener = %delivery.listener, "delivery skipped, listener removed");
                return Ok(());
            }
        };
        let node = Node::at(RootNode::new(Rc::clone(self)), delivery.path);
        let event = Event {
            kind: delivery.kind,
            snapshot: DataSnapshot::new(node, delivery.value),
            prev_key: delivery.prev_key,
        };
        let mut callback = cell
            .try_borrow_mut()
            .map_err(|_| MockError::ListenerBusy(delivery.listener))?;
        trace!(listener = %delivery.listener, event = %event.kind, "delivering");
        (*callback)(&event);
        Ok(())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("queue", &self.queue)
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
