use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Misuse of a state container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("state handler {handler} is disposed (attempted {operation})")]
    Disposed {
        handler: u64,
        operation: &'static str,
    },

    #[error("state handler {handler} exceeded the nested notification limit of {limit}")]
    NotifyDepthExceeded { handler: u64, limit: usize },
}

impl StateError {
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }

    /// Id of the handler that rejected the operation.
    #[must_use]
    pub fn handler(&self) -> u64 {
        match self {
            Self::Disposed { handler, .. } | Self::NotifyDepthExceeded { handler, .. } => *handler,
        }
    }
}
