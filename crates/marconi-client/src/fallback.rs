//! Not-found fallback policy.
//!
//! Every message operation maps a 404 onto a benign value instead of an
//! error. The descriptor for each operation picks one [`Fallback`] and the
//! execute routine turns it into the operation's result type through
//! [`FromFallback`].

use crate::errors::QueueClientError;
use crate::types::MessageStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fallback {
    Null,
    EmptyList,
    EmptyPage,
    False,
}

/// Result types that have a value for a given fallback.
pub trait FromFallback: Sized {
    /// Returns `None` when this type has no value for `fallback`.
    fn from_fallback(fallback: Fallback) -> Option<Self>;
}

impl<T> FromFallback for Option<T> {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Null => Some(None),
            _ => None,
        }
    }
}

impl<T> FromFallback for Vec<T> {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::EmptyList => Some(Vec::new()),
            _ => None,
        }
    }
}

impl FromFallback for MessageStream {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::EmptyPage => Some(MessageStream::empty()),
            _ => None,
        }
    }
}

impl FromFallback for bool {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::False => Some(false),
            _ => None,
        }
    }
}

impl Fallback {
    pub fn apply<T: FromFallback>(self, operation: &'static str) -> Result<T, QueueClientError> {
        T::from_fallback(self).ok_or(QueueClientError::InvalidFallback {
            operation,
            fallback: self,
        })
    }
}
