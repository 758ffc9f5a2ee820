//! Conversation send controller
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime feeds events in and executes the effects that come out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::SendState;
pub use transition::{transition, TransitionError};
