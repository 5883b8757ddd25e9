use std::fmt;

use async_trait::async_trait;

/// Errors a chat adapter can report. None of them change message state;
/// the engine logs them and retries on the next qualifying render.
#[derive(Debug)]
pub enum AdapterError {
    /// Transport failure (timeout, connection refused). Retryable.
    Network(String),
    /// The backend answered with an error.
    Rejected { status: u16, message: String },
    /// The adapter has been shut down.
    Closed,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Network(msg) => write!(f, "network error: {msg}"),
            AdapterError::Rejected { status, message } => {
                write!(f, "rejected (status {status}): {message}")
            }
            AdapterError::Closed => write!(f, "adapter closed"),
        }
    }
}

impl std::error::Error for AdapterError {}

#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Returns the name of the adapter.
    fn name(&self) -> &str;

    /// Tells the backend the user has read up to `message_id`.
    async fn send_read_receipt(&self, message_id: &str) -> Result<(), AdapterError>;

    /// Fetches up to `count` older messages into the session. Resolves to
    /// true once the whole history has been loaded.
    async fn load_previous_messages(&self, count: u32) -> Result<bool, AdapterError>;
}
