//! Events that can occur in a session

use super::state::WaitId;
use crate::transport::{InboundMessage, MessageId};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The message that started the session
    Opened { message: InboundMessage },

    /// The wait `wait` matched a message from the session's user
    Reply {
        wait: WaitId,
        message: InboundMessage,
    },

    /// A message from the session's user that no wait claimed, because it
    /// arrived while the next wait was not armed yet
    Unclaimed { message: InboundMessage },

    /// The wait `wait` ran out
    Timeout { wait: WaitId },

    /// External cancellation (shutdown, operator request)
    Cancel,

    /// An outbound send finished; `message` is `None` when it failed
    SendSettled { message: Option<MessageId> },
}
