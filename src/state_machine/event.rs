//! Events that drive the send controller

use crate::backend::Message;
use crate::query::QueryError;
use std::time::Duration;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        text: String,
        /// Nanoseconds since the epoch, stamped on the optimistic echo
        submitted_at: i64,
    },
    Clear,
    Reload,

    // Remote events
    SendSucceeded {
        reply: Message,
    },
    SendFailed {
        error: QueryError,
    },
    SendTimedOut {
        after: Duration,
    },

    // Connection events
    Connected,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::Clear => "clear",
            Event::Reload => "reload",
            Event::SendSucceeded { .. } => "send_succeeded",
            Event::SendFailed { .. } => "send_failed",
            Event::SendTimedOut { .. } => "send_timed_out",
            Event::Connected => "connected",
        }
    }
}
