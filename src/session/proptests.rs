//! Property-based tests for the session state machine
//!
//! Arbitrary event sequences are folded through `transition` and the
//! termination and tracking invariants are checked on the collected effects.

use super::*;
use crate::helpdesk::{DialogueTree, Node};
use crate::transport::{ChannelId, InboundMessage, MessageId, UserId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    let tree = DialogueTree::from_nodes([
        Node::new("root", "Welcome")
            .with_branch("A", "Go to A")
            .with_branch("B", "Go to B"),
        Node::new("A", "A").with_role(7),
        Node::new("B", "B").with_branch("A", "Over to A"),
    ])
    .unwrap();
    SessionContext::new(Arc::new(tree), UserId(1), ChannelId(2))
}

/// Event template; message ids are assigned in sequence order
#[derive(Debug, Clone)]
enum Step {
    Reply { wait: u64, content: &'static str },
    Unclaimed { content: &'static str },
    Timeout { wait: u64 },
    Cancel,
    Sent { ok: bool },
}

fn arb_content() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("0"),
        Just("1"),
        Just("2"),
        Just("3"),
        Just("-1"),
        Just("bogus"),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (1u64..8, arb_content()).prop_map(|(wait, content)| Step::Reply { wait, content }),
        1 => arb_content().prop_map(|content| Step::Unclaimed { content }),
        1 => (1u64..8).prop_map(|wait| Step::Timeout { wait }),
        1 => Just(Step::Cancel),
        2 => any::<bool>().prop_map(|ok| Step::Sent { ok }),
    ]
}

fn wait_id(n: u64) -> WaitId {
    (1..n).fold(WaitId::FIRST, |w, _| w.next())
}

struct Run {
    states: Vec<SessionState>,
    effects: Vec<Vec<Effect>>,
    inbound: Vec<(MessageId, bool)>,
}

/// Feed the opening message and then every step, recording each outcome.
/// `inbound` records each user message and whether the session was still
/// live when it arrived.
fn run(steps: &[Step]) -> Run {
    let context = test_context();
    let mut state = SessionState::Created;
    let mut next_id = 100u64;
    let mut out = Run {
        states: vec![],
        effects: vec![],
        inbound: vec![],
    };

    let mut events = vec![Event::Opened {
        message: InboundMessage::new(next_id, 1, 2, "hi"),
    }];
    out.inbound.push((MessageId(next_id), true));

    for step in steps {
        next_id += 1;
        let message = |content: &str| InboundMessage::new(next_id, 1, 2, content);
        events.push(match step {
            Step::Reply { wait, content } => Event::Reply {
                wait: wait_id(*wait),
                message: message(content),
            },
            Step::Unclaimed { content } => Event::Unclaimed {
                message: message(content),
            },
            Step::Timeout { wait } => Event::Timeout {
                wait: wait_id(*wait),
            },
            Step::Cancel => Event::Cancel,
            Step::Sent { ok } => Event::SendSettled {
                message: ok.then_some(MessageId(next_id)),
            },
        });
    }

    for event in events {
        if let Event::Reply { message, .. } | Event::Unclaimed { message } = &event {
            out.inbound.push((message.id, !state.is_terminal()));
        }
        let result = transition(&state, &context, event);
        state = result.new_state.clone();
        out.states.push(result.new_state);
        out.effects.push(result.effects);
    }
    out
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_done_is_absorbing(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let run = run(&steps);
        let first_done = run.states.iter().position(SessionState::is_terminal);
        if let Some(first_done) = first_done {
            for (state, effects) in run.states.iter().zip(&run.effects).skip(first_done + 1) {
                prop_assert!(state.is_terminal());
                let only_late_deletes =
                    effects.iter().all(|e| matches!(e, Effect::DeleteLate { .. }));
                prop_assert!(only_late_deletes, "only late deletions after Done");
            }
        }
    }

    #[test]
    fn prop_purge_happens_at_most_once(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let run = run(&steps);
        let purges = run.effects.iter().flatten().filter(|e| **e == Effect::Purge).count();
        let done = run.states.last().is_some_and(SessionState::is_terminal);
        prop_assert_eq!(purges, usize::from(done));
    }

    #[test]
    fn prop_live_messages_tracked_exactly_once(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let run = run(&steps);
        let tracked: Vec<MessageId> = run
            .effects
            .iter()
            .flatten()
            .filter_map(|e| match e {
                Effect::Track { message } => Some(*message),
                _ => None,
            })
            .collect();
        let unique: HashSet<MessageId> = tracked.iter().copied().collect();
        prop_assert_eq!(unique.len(), tracked.len());

        for (id, live) in &run.inbound {
            prop_assert_eq!(unique.contains(id), *live);
        }
    }

    #[test]
    fn prop_one_wait_armed_per_turn(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let run = run(&steps);
        let mut last_armed: Option<WaitId> = None;
        for (state, effects) in run.states.iter().zip(&run.effects) {
            let armed: Vec<WaitId> = effects
                .iter()
                .filter_map(|e| match e {
                    Effect::ArmWait { wait } => Some(*wait),
                    _ => None,
                })
                .collect();
            prop_assert!(armed.len() <= 1);
            if let Some(wait) = armed.first() {
                prop_assert!(last_armed.map_or(true, |last| *wait > last));
                prop_assert_eq!(state.active_wait(), Some(*wait));
                last_armed = Some(*wait);
            }
        }
    }

    #[test]
    fn prop_stale_timeouts_do_nothing(
        steps in proptest::collection::vec(arb_step(), 0..40),
        stale in 1u64..4,
    ) {
        let run = run(&steps);
        let context = test_context();
        let Some(state) = run.states.last() else { return Ok(()); };
        let Some(active) = state.active_wait() else { return Ok(()); };
        let stale = wait_id(stale);
        prop_assume!(stale != active);

        let result = transition(state, &context, Event::Timeout { wait: stale });
        prop_assert_eq!(&result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }
}
