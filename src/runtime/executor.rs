//! Session runtime executor

use super::grant::grant_privilege;
use super::traits::{GrantRegistry, GuildDirectory, Transport};
use super::waiter::{EventWaiter, WaitHandle, WaitOutcome};

use crate::helpdesk::{render_node, NodeId};
use crate::session::{
    transition, CleanupTracker, Effect, Event, SessionContext, SessionState, WaitId,
};
use crate::transport::{ChannelId, InboundMessage, MessageId, RoleId, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to interact with a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: String,
    user: UserId,
    channel: ChannelId,
    event_tx: mpsc::UnboundedSender<Event>,
    terminated: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[allow(dead_code)] // Identity accessor, used in tests
    pub fn user(&self) -> UserId {
        self.user
    }

    #[allow(dead_code)] // Identity accessor, used in tests
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Whether the session has terminated (its messages are being purged)
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Terminate the session. Repeated or late calls are no-ops.
    pub fn cancel(&self) {
        if self.is_terminated() {
            return;
        }
        let _ = self.event_tx.send(Event::Cancel);
    }

    /// Route a message no wait claimed to the session. Returns false if the
    /// session is gone.
    pub fn forward(&self, message: InboundMessage) -> bool {
        !self.is_terminated() && self.event_tx.send(Event::Unclaimed { message }).is_ok()
    }
}

/// Reports a send back to the actor when dropped, so a send task that
/// panics or is aborted still counts as settled
struct SettleOnDrop {
    event_tx: mpsc::UnboundedSender<Event>,
    message: Option<MessageId>,
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        let _ = self.event_tx.send(Event::SendSettled {
            message: self.message.take(),
        });
    }
}

/// One helpdesk conversation, driven as an actor over its event queue
pub struct SessionRuntime<T, D, R>
where
    T: Transport + 'static,
    D: GuildDirectory + 'static,
    R: GrantRegistry + 'static,
{
    context: SessionContext,
    state: SessionState,
    transport: Arc<T>,
    directory: Arc<D>,
    grants: Arc<R>,
    waiter: EventWaiter,
    wait_timeout: Duration,
    event_rx: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
    cleanup: CleanupTracker,
    /// The single outstanding wait, if armed
    active_wait: Option<(WaitId, WaitHandle)>,
    /// Sends whose result has not come back yet
    sends_in_flight: usize,
    /// Deletions still running, awaited before the actor exits
    deletions: Vec<JoinHandle<()>>,
    terminated: Arc<AtomicBool>,
}

impl<T, D, R> SessionRuntime<T, D, R>
where
    T: Transport + 'static,
    D: GuildDirectory + 'static,
    R: GrantRegistry + 'static,
{
    pub fn new(
        context: SessionContext,
        transport: Arc<T>,
        directory: Arc<D>,
        grants: Arc<R>,
        waiter: EventWaiter,
        wait_timeout: Duration,
    ) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let terminated = Arc::new(AtomicBool::new(false));
        let handle = SessionHandle {
            session_id: context.session_id.clone(),
            user: context.user,
            channel: context.channel,
            event_tx: event_tx.clone(),
            terminated: Arc::clone(&terminated),
        };

        let runtime = Self {
            context,
            state: SessionState::Created,
            transport,
            directory,
            grants,
            waiter,
            wait_timeout,
            event_rx,
            event_tx,
            cleanup: CleanupTracker::new(),
            active_wait: None,
            sends_in_flight: 0,
            deletions: Vec::new(),
            terminated,
        };
        (runtime, handle)
    }

    /// Run the session, starting from the message that opened it. Returns
    /// once the session is done, every send has settled and every deletion
    /// has finished.
    pub async fn run(mut self, opening: InboundMessage) {
        tracing::info!(
            session = %self.context.session_id,
            user = %self.context.user,
            channel = %self.context.channel,
            "Starting helpdesk session"
        );

        self.process_event(Event::Opened { message: opening });

        while !self.finished() {
            let Some(event) = self.event_rx.recv().await else {
                break;
            };
            self.process_event(event);
        }

        // Refuse new events; whatever was queued before is still handled
        self.event_rx.close();
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        for result in futures::future::join_all(std::mem::take(&mut self.deletions)).await {
            if let Err(e) = result {
                tracing::error!(session = %self.context.session_id, error = %e, "Purge task failed");
            }
        }

        tracing::info!(
            session = %self.context.session_id,
            user = %self.context.user,
            channel = %self.context.channel,
            "Helpdesk session finished"
        );
    }

    fn finished(&self) -> bool {
        self.state.is_terminal() && self.sends_in_flight == 0
    }

    fn process_event(&mut self, event: Event) {
        if let Event::SendSettled { .. } = &event {
            self.sends_in_flight = self.sends_in_flight.saturating_sub(1);
        }

        // Pure state transition
        let result = transition(&self.state, &self.context, event);
        if result.new_state != self.state {
            tracing::debug!(
                session = %self.context.session_id,
                node = ?result.new_state.cursor(),
                wait = ?result.new_state.active_wait(),
                done = result.new_state.is_terminal(),
                "Session state changed"
            );
        }
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    /// Execute an effect. Outbound I/O is spawned and never awaited here.
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Track { message } => {
                if self.cleanup.track(message) {
                    tracing::debug!(
                        session = %self.context.session_id,
                        message_id = %message,
                        tracked = self.cleanup.len(),
                        "Tracking message"
                    );
                }
            }

            Effect::SendNode { node } => self.send_node(&node),

            Effect::GrantRole { role } => self.grant_role(role),

            Effect::ArmWait { wait } => self.arm_wait(wait),

            Effect::CancelWait { wait } => {
                if let Some((armed, handle)) = self.active_wait.take() {
                    if armed != wait {
                        tracing::debug!(armed = %armed, requested = %wait, "Cancelling newer wait");
                    }
                    handle.cancel();
                }
            }

            Effect::Purge => self.purge(),

            Effect::DeleteLate { message } => {
                tracing::debug!(
                    session = %self.context.session_id,
                    message_id = %message,
                    "Deleting message that arrived after termination"
                );
                self.delete(vec![message]);
            }

            Effect::UnknownTarget { from, target } => {
                tracing::error!(
                    session = %self.context.session_id,
                    user = %self.context.user,
                    node = %from,
                    target = %target,
                    "Branch points at a node missing from the helpdesk model, reprompting"
                );
            }
        }
    }

    fn send_node(&mut self, node_id: &NodeId) {
        let Some(node) = self.context.tree.lookup(node_id) else {
            tracing::error!(node = %node_id, "Cannot render node missing from the helpdesk model");
            return;
        };
        let Some(channel) = self.transport.resolve_channel(self.context.channel) else {
            tracing::warn!(channel = %self.context.channel, "Where did the channel go?");
            return;
        };

        let content = render_node(node);
        let transport = Arc::clone(&self.transport);
        let user = self.context.user;
        let node_id = node_id.clone();
        let mut settle = SettleOnDrop {
            event_tx: self.event_tx.clone(),
            message: None,
        };
        self.sends_in_flight += 1;

        tokio::spawn(async move {
            match transport.send_message(&channel, &content).await {
                Ok(id) => settle.message = Some(id),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        user = %user,
                        channel = %channel.id,
                        node = %node_id,
                        "Failed to send message"
                    );
                }
            }
        });
    }

    fn grant_role(&self, role: RoleId) {
        let transport = Arc::clone(&self.transport);
        let directory = Arc::clone(&self.directory);
        let grants = Arc::clone(&self.grants);
        let user = self.context.user;
        let channel = self.context.channel;

        tokio::spawn(async move {
            grant_privilege(&*transport, &*directory, &*grants, user, channel, role).await;
        });
    }

    fn arm_wait(&mut self, wait: WaitId) {
        let user = self.context.user;
        let channel = self.context.channel;
        let event_tx = self.event_tx.clone();

        let handle = self.waiter.wait_for(
            move |m: &InboundMessage| m.author == user && m.channel == channel,
            self.wait_timeout,
            move |outcome| {
                let event = match outcome {
                    WaitOutcome::Matched(message) => Event::Reply { wait, message },
                    WaitOutcome::TimedOut => Event::Timeout { wait },
                };
                let _ = event_tx.send(event);
            },
        );

        if let Some((_, previous)) = self.active_wait.replace((wait, handle)) {
            previous.cancel();
        }
    }

    /// Terminal cleanup: runs once, no matter how termination was triggered
    fn purge(&mut self) {
        if self
            .terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Some((_, handle)) = self.active_wait.take() {
            handle.cancel();
        }

        let ids = self.cleanup.seal();
        tracing::info!(
            session = %self.context.session_id,
            user = %self.context.user,
            channel = %self.context.channel,
            messages = ids.len(),
            "Helpdesk session done, purging messages"
        );
        self.delete(ids);
    }

    fn delete(&mut self, ids: Vec<MessageId>) {
        if ids.is_empty() {
            return;
        }
        let Some(channel) = self.transport.resolve_channel(self.context.channel) else {
            tracing::warn!(channel = %self.context.channel, "Where did the channel go?");
            return;
        };

        let transport = Arc::clone(&self.transport);
        let user = self.context.user;
        let deletion = tokio::spawn(async move {
            for (id, result) in transport.purge(&channel, &ids).await {
                if let Err(e) = result {
                    tracing::error!(
                        error = %e,
                        user = %user,
                        channel = %channel.id,
                        message_id = %id,
                        "Failed to purge message"
                    );
                }
            }
        });
        self.deletions.push(deletion);
    }
}
