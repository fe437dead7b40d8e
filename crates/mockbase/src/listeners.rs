//! Listener registry of one endpoint.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mockbase_path::Path;

use crate::error::MockError;
use crate::events::{Event, EventType};

pub type Callback = Box<dyn FnMut(&Event)>;
pub type CancelCallback = Box<dyn FnOnce(&MockError)>;

/// Identity of a registered listener. Ids grow with registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Listener {
    pub id: ListenerId,
    pub kind: EventType,
    pub path: Path,
    callback: Rc<RefCell<Callback>>,
    cancel: Option<CancelCallback>,
    pending: bool,
}

impl Listener {
    /// Whether the initial delivery has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn callback(&self) -> Rc<RefCell<Callback>> {
        Rc::clone(&self.callback)
    }

    pub fn take_cancel(&mut self) -> Option<CancelCallback> {
        self.cancel.take()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            listeners: BTreeMap::new(),
        }
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Kinds that fire on registration start out pending.
    pub fn register(
        &mut self,
        path: Path,
        kind: EventType,
        callback: Callback,
        cancel: Option<CancelCallback>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(
            id,
            Listener {
                id,
                kind,
                path,
                callback: Rc::new(RefCell::new(callback)),
                cancel,
                pending: kind.fires_on_register(),
            },
        );
        id
    }

    pub fn unregister(&mut self, id: ListenerId) -> Option<Listener> {
        self.listeners.remove(&id)
    }

    /// Remove every listener at `path`, of `kind` when given.
    pub fn unregister_matching(&mut self, path: &Path, kind: Option<EventType>) -> Vec<Listener> {
        let ids: Vec<ListenerId> = self
            .listeners
            .values()
            .filter(|l| &l.path == path && kind.map_or(true, |k| k == l.kind))
            .map(|l| l.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.listeners.remove(&id))
            .collect()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn get(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners.get(&id)
    }

    /// Clear the pending flag once the initial delivery runs.
    pub fn mark_delivered(&mut self, id: ListenerId) {
        if let Some(listener) = self.listeners.get_mut(&id) {
            listener.pending = false;
        }
    }

    /// Listeners in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.values()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
