use mockbase_path::Path;
use serde_json::Value;
use tracing::trace;

use crate::diff::{diff, Diff};
use crate::snapshot::Snapshot;

/// Holds the current snapshot of one endpoint.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Snapshot,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Plain JSON at `path`; `null` when nothing is stored there.
    pub fn read(&self, path: &Path) -> Value {
        self.current.value_at(path)
    }

    /// Replace the stored snapshot and return what changed.
    pub fn write(&mut self, next: Snapshot) -> Diff {
        let changes = diff(&self.current, &next);
        trace!(changes = changes.len(), "snapshot replaced");
        self.current = next;
        changes
    }
}
