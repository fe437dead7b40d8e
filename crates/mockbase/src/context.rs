//! Entry point: options, the injected clock and the endpoint cache.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mockbase_path::Url;
use mockbase_util::IdGenerator;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::endpoint::Endpoint;
use crate::error::MockError;
use crate::node::{Node, RootNode};

/// Options for [`MockContext::with_options`].
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use mockbase::{ManualClock, MockContext, MockOptions};
///
/// let ctx = MockContext::with_options(
///     MockOptions::default()
///         .seed(7)
///         .clock(Rc::new(ManualClock::new(1_000))),
/// );
/// assert_eq!(ctx.seed(), 7);
/// ```
#[derive(Clone)]
pub struct MockOptions {
    seed: Option<u64>,
    clock: Rc<dyn Clock>,
    scheme: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            seed: None,
            clock: Rc::new(SystemClock),
            scheme: "mock".to_string(),
        }
    }
}

impl MockOptions {
    /// Seed for generated endpoint names and push ids.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Scheme of generated endpoint names.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

impl fmt::Debug for MockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockOptions")
            .field("seed", &self.seed)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Owns the endpoint cache. Handles for the same endpoint share state only
/// when obtained from the same context.
pub struct MockContext {
    ids: Rc<RefCell<IdGenerator>>,
    clock: Rc<dyn Clock>,
    scheme: String,
    cache: RefCell<BTreeMap<String, Rc<Endpoint>>>,
}

impl Default for MockContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContext {
    pub fn new() -> Self {
        Self::with_options(MockOptions::default())
    }

    pub fn with_options(options: MockOptions) -> Self {
        let ids = IdGenerator::new(options.seed);
        debug!(seed = ids.seed, scheme = %options.scheme, "mock context created");
        Self {
            ids: Rc::new(RefCell::new(ids)),
            clock: options.clock,
            scheme: options.scheme,
            cache: RefCell::new(BTreeMap::new()),
        }
    }

    /// A handle for `url`, or for the root of a new endpoint with a random
    /// name when `None`.
    ///
    /// Handles for the same `scheme://host` share one endpoint until
    /// [`MockContext::reset`].
    ///
    /// # Errors
    ///
    /// `MockError::InvalidArgument` when `url` is not a valid address.
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase::MockContext;
    /// use serde_json::json;
    ///
    /// let ctx = MockContext::new();
    /// let a = ctx.reference(Some("mock://db/users/ada")).unwrap();
    /// let root = ctx.reference(Some("mock://db")).unwrap();
    /// a.set(&json!({"born": 1815})).unwrap();
    /// assert_eq!(root.get_data(), json!({"users": {"ada": {"born": 1815}}}));
    /// assert_eq!(a.to_string(), "mock://db/users/ada");
    /// ```
    pub fn reference(&self, url: Option<&str>) -> Result<Node, MockError> {
        let url = match url {
            Some(url) => Url::parse(url)?,
            None => {
                let host = self.ids.borrow_mut().endpoint_name();
                Url::new(format!("{}://{}", self.scheme, host), Default::default())
            }
        };
        let (name, path) = url.into_parts();
        let endpoint = self.endpoint(name);
        Ok(Node::at(RootNode::new(endpoint), path))
    }

    fn endpoint(&self, name: String) -> Rc<Endpoint> {
        let mut cache = self.cache.borrow_mut();
        let endpoint = cache.entry(name).or_insert_with_key(|name| {
            Endpoint::new(name.clone(), Rc::clone(&self.clock), Rc::clone(&self.ids))
        });
        Rc::clone(endpoint)
    }

    /// Forget every cached endpoint. Existing handles keep working on their
    /// own endpoint; new handles get fresh ones.
    pub fn reset(&self) {
        let dropped = std::mem::take(&mut *self.cache.borrow_mut());
        debug!(endpoints = dropped.len(), "endpoint cache reset");
    }

    /// Names of the cached endpoints in sorted order.
    pub fn endpoints(&self) -> Vec<String> {
        self.cache.borrow().keys().cloned().collect()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    /// Seed of the id generator.
    pub fn seed(&self) -> u64 {
        self.ids.borrow().seed
    }
}

impl fmt::Debug for MockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockContext")
            .field("seed", &self.seed())
            .field("scheme", &self.scheme)
            .field("endpoints", &self.endpoints())
            .finish_non_exhaustive()
    }
}
