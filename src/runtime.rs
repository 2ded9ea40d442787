//! Runtime for helpdesk sessions
//!
//! Routes inbound messages to pending waits, starts a session for users who
//! open a conversation in a helpdesk channel, and cancels sessions on
//! request or shutdown.

mod executor;
mod grant;
pub mod traits;
mod waiter;


pub use executor::{SessionHandle, SessionRuntime};
#[allow(unused_imports)] // Used by tests
pub use grant::{grant_privilege, GrantOutcome};
pub use traits::*;
pub use waiter::EventWaiter;

use crate::helpdesk::DialogueTree;
use crate::session::SessionContext;
use crate::transport::{ChannelId, InboundMessage, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Sessions are per user and channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user: UserId,
    pub channel: ChannelId,
}

/// Session settings shared by every session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Channels where any message opens a session
    pub helpdesk_channels: HashSet<ChannelId>,
    /// How long each wait for a reply lasts
    pub wait_timeout: Duration,
}

struct ManagedSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

type SessionMap = Arc<RwLock<HashMap<SessionKey, ManagedSession>>>;

/// Manager for all helpdesk sessions
pub struct SessionManager<T, D, R>
where
    T: Transport + 'static,
    D: GuildDirectory + 'static,
    R: GrantRegistry + 'static,
{
    tree: Arc<DialogueTree>,
    transport: Arc<T>,
    directory: Arc<D>,
    grants: Arc<R>,
    waiter: EventWaiter,
    config: SessionConfig,
    sessions: SessionMap,
}

impl<T, D, R> SessionManager<T, D, R>
where
    T: Transport + 'static,
    D: GuildDirectory + 'static,
    R: GrantRegistry + 'static,
{
    pub fn new(
        tree: Arc<DialogueTree>,
        transport: Arc<T>,
        directory: Arc<D>,
        grants: Arc<R>,
        config: SessionConfig,
    ) -> Self {
        Self {
            tree,
            transport,
            directory,
            grants,
            waiter: EventWaiter::new(),
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the event waiter
    #[allow(dead_code)] // Used in tests
    pub fn waiter(&self) -> &EventWaiter {
        &self.waiter
    }

    /// Handle a message received from the chat
    pub async fn handle_message(&self, message: InboundMessage) {
        if message.author_is_bot {
            return;
        }

        // Replies go straight to the session waiting for them
        if self.waiter.dispatch(&message) {
            return;
        }

        let key = SessionKey {
            user: message.author,
            channel: message.channel,
        };
        let mut sessions = self.sessions.write().await;

        // A live session between two waits
        if let Some(existing) = sessions.get(&key) {
            if existing.handle.forward(message.clone()) {
                tracing::debug!(
                    session = %existing.handle.session_id(),
                    message_id = %message.id,
                    "Forwarded unclaimed message to live session"
                );
                return;
            }
        }

        if !self.config.helpdesk_channels.contains(&message.channel) {
            return;
        }

        let session = self.start_session(key, message);
        if let Some(previous) = sessions.insert(key, session) {
            tracing::debug!(
                session = %previous.handle.session_id(),
                "Replaced terminated session"
            );
        }
    }

    fn start_session(&self, key: SessionKey, opening: InboundMessage) -> ManagedSession {
        let context = SessionContext::new(Arc::clone(&self.tree), key.user, key.channel);
        let (runtime, handle) = SessionRuntime::new(
            context,
            Arc::clone(&self.transport),
            Arc::clone(&self.directory),
            Arc::clone(&self.grants),
            self.waiter.clone(),
            self.config.wait_timeout,
        );

        let sessions = Arc::clone(&self.sessions);
        let session_id = handle.session_id().to_string();
        let task = tokio::spawn(async move {
            runtime.run(opening).await;

            // Only remove the entry if a newer session has not taken the key
            let mut sessions = sessions.write().await;
            if sessions
                .get(&key)
                .is_some_and(|s| s.handle.session_id() == session_id)
            {
                sessions.remove(&key);
            }
        });

        ManagedSession { handle, task }
    }

    /// Cancel the session of `user` in `channel`. Returns whether one was live.
    #[allow(dead_code)] // Operator API, used in tests
    pub async fn cancel(&self, user: UserId, channel: ChannelId) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&SessionKey { user, channel }) {
            Some(session) if !session.handle.is_terminated() => {
                session.handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Cancel every session and wait for all of them to finish cleaning up
    pub async fn cancel_all(&self) {
        let drained: Vec<ManagedSession> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, s)| s).collect()
        };
        if drained.is_empty() {
            return;
        }

        tracing::info!(sessions = drained.len(), "Cancelling helpdesk sessions");
        let tasks: Vec<JoinHandle<()>> = drained
            .into_iter()
            .map(|s| {
                s.handle.cancel();
                s.task
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Helpdesk session task failed");
            }
        }
    }

    /// Number of sessions that have not terminated
    pub async fn active_sessions(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.handle.is_terminated())
            .count()
    }
}
