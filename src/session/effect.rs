//! Effects produced by state transitions

use super::state::WaitId;
use crate::helpdesk::NodeId;
use crate::transport::{MessageId, RoleId};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Add a message to the cleanup set
    Track { message: MessageId },

    /// Render the node and send it to the channel
    SendNode { node: NodeId },

    /// Grant the node's role to the user
    GrantRole { role: RoleId },

    /// Subscribe for the user's next message in the channel
    ArmWait { wait: WaitId },

    /// Drop the subscription if it is still pending
    CancelWait { wait: WaitId },

    /// Delete every tracked message; the cleanup set is closed afterwards
    Purge,

    /// Delete a message that reached the session after the purge
    DeleteLate { message: MessageId },

    /// A branch pointed at a node missing from the tree
    UnknownTarget { from: NodeId, target: NodeId },
}
