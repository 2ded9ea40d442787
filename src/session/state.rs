//! Session state types

use crate::helpdesk::{DialogueTree, NodeId};
use crate::transport::{ChannelId, UserId};
use std::fmt;
use std::sync::Arc;

/// Epoch of an armed wait. Every wait a session arms gets the next id, so
/// outcomes of superseded waits can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitId(u64);

impl WaitId {
    pub const FIRST: WaitId = WaitId(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for WaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Opening message not yet interpreted
    #[default]
    Created,

    /// `node` was sent and `wait` is armed for the user's answer to it
    AwaitingReply { node: NodeId, wait: WaitId },

    /// Terminated; messages purged. Nothing leaves this state.
    Done,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done)
    }

    /// Node the user is currently answering
    pub fn cursor(&self) -> Option<&NodeId> {
        match self {
            SessionState::AwaitingReply { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn active_wait(&self) -> Option<WaitId> {
        match self {
            SessionState::AwaitingReply { wait, .. } => Some(*wait),
            _ => None,
        }
    }
}

/// Context for a session (immutable for its whole life)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user: UserId,
    pub channel: ChannelId,
    pub tree: Arc<DialogueTree>,
}

impl SessionContext {
    pub fn new(tree: Arc<DialogueTree>, user: UserId, channel: ChannelId) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user,
            channel,
            tree,
        }
    }
}
