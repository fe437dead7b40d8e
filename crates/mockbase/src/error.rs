use mockbase_path::PathError;
use thiserror::Error;

use crate::listeners::ListenerId;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] PathError),
    #[error("unknown event type {0:?}")]
    UnknownEvent(String),
    #[error("{0} can only be called on a root reference")]
    NotRoot(&'static str),
    #[error("listener {0} is already running")]
    ListenerBusy(ListenerId),
    #[error("deferred callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MockError {
    /// A callback failure carrying a plain message.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into().into())
    }
}
