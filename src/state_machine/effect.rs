//! Effects produced by state transitions

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the remote send (spawned as a background task)
    DispatchSend { text: String },

    /// Mark the cached history stale
    InvalidateHistory,

    /// Re-read history through the cache
    RefreshHistory,

    /// Replace the cached history with an empty list, locally only
    ClearLocalHistory,

    /// Log a failed send and surface it to the view
    RecordFailure { message: String },

    /// Drop any previously surfaced failure
    ClearFailure,

    /// Publish a fresh view snapshot
    NotifyView,
}

impl Effect {
    pub fn dispatch_send(text: impl Into<String>) -> Self {
        Effect::DispatchSend { text: text.into() }
    }

    pub fn record_failure(message: impl Into<String>) -> Self {
        Effect::RecordFailure {
            message: message.into(),
        }
    }
}
