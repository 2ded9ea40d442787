//! Helpdesk session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime executes the effects and feeds back the resulting events.

mod cleanup;
mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use cleanup::CleanupTracker;
pub use effect::Effect;
pub use event::Event;
pub use state::{SessionContext, SessionState, WaitId};
pub use transition::transition;
