//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects, with no I/O.

use super::{Effect, Event, SessionContext, SessionState, WaitId};
use crate::helpdesk::{interpret, Choice, Node, NodeId};
use crate::transport::InboundMessage;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    fn unchanged(state: &SessionState) -> Self {
        Self::new(state.clone())
    }
}

/// Pure transition function
pub fn transition(state: &SessionState, context: &SessionContext, event: Event) -> TransitionResult {
    match (state, event) {
        // ============================================================
        // Outbound send bookkeeping
        // ============================================================
        (_, Event::SendSettled { message: None }) => TransitionResult::unchanged(state),

        // The purge already ran without this id
        (SessionState::Done, Event::SendSettled { message: Some(id) }) => {
            TransitionResult::new(SessionState::Done).with_effect(Effect::DeleteLate { message: id })
        }

        (_, Event::SendSettled { message: Some(id) }) => {
            TransitionResult::unchanged(state).with_effect(Effect::Track { message: id })
        }

        // ============================================================
        // Conversation
        // ============================================================

        // Queued before termination took effect; nobody will answer it
        (SessionState::Done, Event::Reply { message, .. } | Event::Unclaimed { message }) => {
            TransitionResult::new(SessionState::Done)
                .with_effect(Effect::DeleteLate { message: message.id })
        }

        // The opening message is read as an answer to the root prompt
        (SessionState::Created, Event::Opened { message }) => {
            answer(context, context.tree.root(), WaitId::FIRST, &message, vec![])
        }

        (SessionState::AwaitingReply { node, wait }, Event::Reply { wait: replied, message }) => {
            // A reply to an older wait means the active one is still pending
            let pre = if replied == *wait {
                vec![]
            } else {
                vec![Effect::CancelWait { wait: *wait }]
            };
            answer(context, cursor(context, node), wait.next(), &message, pre)
        }

        (SessionState::AwaitingReply { node, wait }, Event::Unclaimed { message }) => answer(
            context,
            cursor(context, node),
            wait.next(),
            &message,
            vec![Effect::CancelWait { wait: *wait }],
        ),

        // ============================================================
        // Termination
        // ============================================================
        (SessionState::AwaitingReply { wait, .. }, Event::Timeout { wait: fired })
            if fired == *wait =>
        {
            TransitionResult::new(SessionState::Done).with_effect(Effect::Purge)
        }

        (SessionState::AwaitingReply { wait, .. }, Event::Cancel) => {
            TransitionResult::new(SessionState::Done)
                .with_effect(Effect::CancelWait { wait: *wait })
                .with_effect(Effect::Purge)
        }

        (SessionState::Created, Event::Cancel) => {
            TransitionResult::new(SessionState::Done).with_effect(Effect::Purge)
        }

        // Stale timeouts, duplicate triggers
        (_, _) => TransitionResult::unchanged(state),
    }
}

/// Node the session is waiting on; a cursor always comes from the tree, the
/// root is only a fallback.
fn cursor<'a>(context: &'a SessionContext, node: &NodeId) -> &'a Node {
    context
        .tree
        .lookup(node)
        .unwrap_or_else(|| context.tree.root())
}

/// Handle the user's answer to `current`
fn answer(
    context: &SessionContext,
    current: &Node,
    next_wait: WaitId,
    message: &InboundMessage,
    pre: Vec<Effect>,
) -> TransitionResult {
    let mut effects = pre;
    effects.push(Effect::Track {
        message: message.id,
    });

    let next = match interpret(&message.content, current) {
        Choice::Reprompt => current,
        Choice::GoToRoot => context.tree.root(),
        Choice::GoTo(target) => {
            if let Some(node) = context.tree.lookup(&target) {
                node
            } else {
                effects.push(Effect::UnknownTarget {
                    from: current.id.clone(),
                    target,
                });
                current
            }
        }
    };

    advance(next, next_wait).with_effects_first(effects)
}

/// Present `node` and wait for the answer
fn advance(node: &Node, wait: WaitId) -> TransitionResult {
    let mut result = TransitionResult::new(SessionState::AwaitingReply {
        node: node.id.clone(),
        wait,
    })
    .with_effect(Effect::SendNode {
        node: node.id.clone(),
    });
    if let Some(role) = node.role_id {
        result = result.with_effect(Effect::GrantRole { role });
    }
    result.with_effect(Effect::ArmWait { wait })
}

impl TransitionResult {
    fn with_effects_first(mut self, mut effects: Vec<Effect>) -> Self {
        effects.append(&mut self.effects);
        self.effects = effects;
        self
    }
}
