//! Explicitly drained FIFO of deferred work.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

use crate::error::MockError;

pub type Task = Box<dyn FnOnce() -> Result<(), MockError>>;

/// FIFO of deferred tasks owned by one endpoint.
///
/// Nothing runs until [`DeferredQueue::flush`] is called. No borrow is held
/// while a task runs, so tasks may defer more work or flush recursively.
#[derive(Default)]
pub struct DeferredQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `task` to the tail without running it.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() -> Result<(), MockError> + 'static,
    {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run tasks from the head until the queue is empty, including tasks
    /// deferred while flushing. Returns how many tasks ran.
    ///
    /// # Errors
    ///
    /// The first failing task stops the drain and its error is returned.
    /// Tasks behind it stay queued for the next flush.
    pub fn flush(&self) -> Result<usize, MockError> {
        let mut ran = 0usize;
        loop {
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            ran += 1;
            trace!(task = ran, "running deferred task");
            if let Err(err) = task() {
                debug!(ran, remaining = self.len(), error = %err, "flush aborted");
                return Err(err);
            }
        }
        debug!(ran, "flush drained queue");
        Ok(ran)
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending", &self.len())
            .finish()
    }
}
