//! One-shot subscriptions for inbound messages
//!
//! A wait registers a predicate and a timeout. The first of "a message
//! matching the predicate is dispatched" and "the timeout elapses" wins and
//! is delivered to the callback; a cancelled wait delivers nothing.

use crate::transport::InboundMessage;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a wait resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Matched(InboundMessage),
    TimedOut,
}

type Predicate = Box<dyn Fn(&InboundMessage) -> bool + Send + Sync>;
type OnOutcome = Box<dyn FnOnce(WaitOutcome) + Send>;

struct Registration {
    predicate: Predicate,
    on_outcome: OnOutcome,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Registrations {
    next_id: u64,
    /// Keyed by registration order, so dispatch visits older waits first
    pending: BTreeMap<u64, Registration>,
}

fn lock(registrations: &Mutex<Registrations>) -> MutexGuard<'_, Registrations> {
    registrations
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Registry of pending waits, shared by every session
#[derive(Clone, Default)]
pub struct EventWaiter {
    registrations: Arc<Mutex<Registrations>>,
}

impl EventWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the next dispatched message matching `predicate`.
    ///
    /// Exactly one of these happens: `on_outcome` gets the matching message,
    /// `on_outcome` gets `TimedOut` after `timeout`, or the wait is cancelled
    /// through the returned handle and `on_outcome` is dropped uncalled.
    /// Must be called within a tokio runtime.
    pub fn wait_for<P, F>(&self, predicate: P, timeout: Duration, on_outcome: F) -> WaitHandle
    where
        P: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
        F: FnOnce(WaitOutcome) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let id = {
            let mut registrations = lock(&self.registrations);
            let id = registrations.next_id;
            registrations.next_id += 1;
            registrations.pending.insert(
                id,
                Registration {
                    predicate: Box::new(predicate),
                    on_outcome: Box::new(on_outcome),
                    cancel: cancel.clone(),
                },
            );
            id
        };

        let registrations = Arc::downgrade(&self.registrations);
        let timer_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    let Some(registrations) = registrations.upgrade() else {
                        return;
                    };
                    // Whoever removes the registration owns the outcome
                    let expired = lock(&registrations).pending.remove(&id);
                    if let Some(registration) = expired {
                        (registration.on_outcome)(WaitOutcome::TimedOut);
                    }
                }
                () = timer_cancel.cancelled() => {}
            }
        });

        WaitHandle {
            id,
            cancel,
            registrations: Arc::downgrade(&self.registrations),
        }
    }

    /// Offer a message to every pending wait. Each matching wait is resolved
    /// with it. Returns whether any wait claimed the message.
    pub fn dispatch(&self, message: &InboundMessage) -> bool {
        let matched: Vec<Registration> = {
            let mut registrations = lock(&self.registrations);
            let ids: Vec<u64> = registrations
                .pending
                .iter()
                .filter(|(_, r)| (r.predicate)(message))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| registrations.pending.remove(&id))
                .collect()
        };

        let claimed = !matched.is_empty();
        for registration in matched {
            registration.cancel.cancel();
            (registration.on_outcome)(WaitOutcome::Matched(message.clone()));
        }
        claimed
    }

    /// Number of waits not yet resolved or cancelled
    pub fn pending(&self) -> usize {
        lock(&self.registrations).pending.len()
    }
}

/// Cancellable handle to one pending wait
#[derive(Debug)]
pub struct WaitHandle {
    id: u64,
    cancel: CancellationToken,
    registrations: Weak<Mutex<Registrations>>,
}

impl WaitHandle {
    /// Withdraw the wait. Harmless if it already resolved.
    pub fn cancel(&self) {
        self.cancel.cancel();
        if let Some(registrations) = self.registrations.upgrade() {
            lock(&registrations).pending.remove(&self.id);
        }
    }
}
