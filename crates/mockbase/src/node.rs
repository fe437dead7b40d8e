//! Handles to one location of one endpoint.
//!
//! A [`Node`] is cheap to clone. Every handle of an endpoint shares the same
//! store, queue and listener registry, so listeners registered through one
//! handle see writes made through any other and `flush` on any handle drains
//! the whole endpoint.

use std::fmt;
use std::rc::Rc;

use mockbase_path::{Path, Url};
use serde_json::{Map, Value};
use tracing::debug;

use crate::diff::Diff;
use crate::endpoint::Endpoint;
use crate::error::MockError;
use crate::events::{Event, EventType};
use crate::listeners::ListenerId;
use crate::snapshot::Snapshot;

static ROOT_PATH: Path = Path::root();

/// The root of an endpoint. Owns the endpoint state.
#[derive(Clone)]
pub struct RootNode {
    endpoint: Rc<Endpoint>,
}

impl RootNode {
    pub(crate) fn new(endpoint: Rc<Endpoint>) -> Self {
        Self { endpoint }
    }

    /// Replace the whole tree with `value`.
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` if `value` holds an invalid key or is
    /// nested too deep.
    pub fn set_data(&self, value: &Value) -> Result<Diff, MockError> {
        let tree = self.endpoint.prepare(&ROOT_PATH, value)?;
        Ok(self.endpoint.write(vec![(Path::root(), tree)]))
    }
}

/// A location below the root of an endpoint.
#[derive(Clone)]
pub struct ChildNode {
    root: RootNode,
    path: Path,
}

/// Handle to a node of an endpoint.
#[derive(Clone)]
pub enum Node {
    Root(RootNode),
    Child(ChildNode),
}

impl Node {
    pub(crate) fn at(root: RootNode, path: Path) -> Self {
        if path.is_root() {
            Node::Root(root)
        } else {
            Node::Child(ChildNode { root, path })
        }
    }

    fn root_node(&self) -> &RootNode {
        match self {
            Node::Root(root) => root,
            Node::Child(child) => &child.root,
        }
    }

    fn endpoint(&self) -> &Rc<Endpoint> {
        &self.root_node().endpoint
    }

    /// Another handle to the same node.
    pub fn reference(&self) -> Node {
        self.clone()
    }

    /// The parent node, or `None` at the root.
    pub fn parent(&self) -> Option<Node> {
        let parent = self.path().parent()?;
        Some(Node::at(self.root_node().clone(), parent))
    }

    /// The node at `path` relative to this one.
    ///
    /// `path` may span several segments (`"a/b"`), and `..` steps up without
    /// leaving the endpoint.
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` for an empty path or one that exceeds the
    /// depth or key length limits.
    pub fn child(&self, path: &str) -> Result<Node, MockError> {
        let path = self.path().child(path)?;
        Ok(Node::at(self.root_node().clone(), path))
    }

    pub fn root(&self) -> Node {
        Node::Root(self.root_node().clone())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root(_))
    }

    /// Last path segment, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.path().key()
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::Root(_) => &ROOT_PATH,
            Node::Child(child) => &child.path,
        }
    }

    /// Name of the endpoint, `scheme://host`.
    pub fn endpoint_name(&self) -> &str {
        self.endpoint().name()
    }

    pub fn url(&self) -> Url {
        Url::new(self.endpoint_name(), self.path().clone())
    }

    /// Whether both handles address the same endpoint.
    pub fn same_endpoint(&self, other: &Node) -> bool {
        Rc::ptr_eq(self.endpoint(), other.endpoint())
    }

    /// Current data at this node; `null` when absent.
    pub fn get_data(&self) -> Value {
        self.endpoint().read(self.path())
    }

    /// Register a listener for `event` at this node.
    ///
    /// Nothing is delivered until the endpoint is flushed. `value` and
    /// `child_added` listeners then receive the data present at flush time.
    pub fn on<F>(&self, event: EventType, callback: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.endpoint()
            .register(self.path().clone(), event, Box::new(callback), None)
    }

    /// Like [`Node::on`], with a callback run if the listener is cancelled
    /// by [`Node::force_cancel`].
    pub fn on_with_cancel<F, C>(&self, event: EventType, callback: F, cancel: C) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
        C: FnOnce(&MockError) + 'static,
    {
        self.endpoint().register(
            self.path().clone(),
            event,
            Box::new(callback),
            Some(Box::new(cancel)),
        )
    }

    /// Remove the listeners at this node, only those of `event` when given.
    /// Returns how many were removed. Deliveries already queued for them are
    /// dropped.
    pub fn off(&self, event: Option<EventType>) -> usize {
        self.endpoint().unregister_matching(self.path(), event)
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off_listener(&self, id: ListenerId) -> bool {
        self.endpoint().unregister(id)
    }

    /// Queue `task` on the endpoint. It runs on the next flush.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() -> Result<(), MockError> + 'static,
    {
        self.endpoint().queue().defer(task);
    }

    /// Run every queued task of the endpoint, including tasks queued while
    /// flushing. Returns how many ran.
    ///
    /// # Errors
    ///
    /// The error of the first failing task; the tasks behind it stay queued.
    pub fn flush(&self) -> Result<usize, MockError> {
        self.endpoint().queue().flush()
    }

    /// Number of tasks waiting for the next flush.
    pub fn queued(&self) -> usize {
        self.endpoint().queue().len()
    }

    /// Replace the whole tree. Only allowed on the root.
    ///
    /// # Errors
    ///
    /// `MockError::NotRoot` on a child handle, otherwise as
    /// [`RootNode::set_data`].
    pub fn set_data(&self, value: &Value) -> Result<Diff, MockError> {
        match self {
            Node::Root(root) => root.set_data(value),
            Node::Child(_) => Err(MockError::NotRoot("set_data")),
        }
    }

    /// Replace the data at this node. `null` removes it.
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` if an object key in `value` is empty,
    /// contains `/` or is too long, or if its leaves would sit deeper than
    /// the maximum path depth. Nothing is written in that case.
    pub fn set(&self, value: &Value) -> Result<Diff, MockError> {
        let tree = self.endpoint().prepare(self.path(), value)?;
        Ok(self.endpoint().write(vec![(self.path().clone(), tree)]))
    }

    /// Write each entry of `values` below this node in a single change.
    /// Keys may be relative paths; `null` entries remove.
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` if any key is not a valid path or any
    /// value fails the checks of [`Node::set`]. Nothing is written in that
    /// case.
    pub fn update(&self, values: &Map<String, Value>) -> Result<Diff, MockError> {
        let writes = values
            .iter()
            .map(|(key, value)| -> Result<(Path, Snapshot), MockError> {
                let path = self.path().child(key)?;
                let tree = self.endpoint().prepare(&path, value)?;
                Ok((path, tree))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.endpoint().write(writes))
    }

    pub fn remove(&self) -> Diff {
        self.endpoint()
            .write(vec![(self.path().clone(), Snapshot::empty())])
    }

    /// Write `value` under a new chronologically ordered key and return the
    /// new child.
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` if this node is already at the maximum
    /// depth or `value` is rejected by [`Node::set`].
    pub fn push(&self, value: &Value) -> Result<Node, MockError> {
        let key = self.endpoint().next_push_id();
        let child = self.child(&key)?;
        debug!(url = %child.url(), "push");
        if !value.is_null() {
            child.set(value)?;
        }
        Ok(child)
    }

    /// Queue cancellation of the listeners at this node (only those of
    /// `event` when given). When the task runs, each listener is removed and
    /// its cancel callback receives `error`.
    pub fn force_cancel(&self, error: MockError, event: Option<EventType>) {
        self.endpoint()
            .force_cancel(self.path().clone(), event, error);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_endpoint(other) && self.path() == other.path()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint_name(), self.path())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.to_string()).finish()
    }
}

impl From<RootNode> for Node {
    fn from(root: RootNode) -> Self {
        Node::Root(root)
    }
}

impl fmt::Debug for RootNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootNode")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl fmt::Debug for ChildNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildNode")
            .field("endpoint", &self.root.endpoint.name())
            .field("path", &self.path)
            .finish()
    }
}
