use crate::fallback::Fallback;

/// Errors surfaced by the message bindings.
///
/// There is no not-found variant: a 404 is turned into the
/// operation's fallback value inside [`crate::operation::execute`].
#[derive(Debug, thiserror::Error)]
pub enum QueueClientError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation {operation} cannot produce its result from fallback {fallback:?}")]
    InvalidFallback {
        operation: &'static str,
        fallback: Fallback,
    },
}

pub type QueueClientResult<T> = Result<T, QueueClientError>;

impl QueueClientError {
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}
