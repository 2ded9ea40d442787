//! Line-oriented console transport
//!
//! Reads `<user id>: <text>` lines (or bare text from the default user) as
//! messages in a single helpdesk channel and prints everything the bot does.
//! Every role and member exists in the one guild.

use super::{
    Channel, ChannelId, GuildId, InboundMessage, Member, MessageId, Role, RoleId,
    TransportError, UserId,
};
use crate::runtime::{GuildDirectory, Transport};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ConsoleTransport<W: Write + Send> {
    channel: ChannelId,
    guild: GuildId,
    default_user: UserId,
    next_id: AtomicU64,
    /// Messages shown and not deleted yet
    live: Mutex<HashSet<MessageId>>,
    out: Mutex<W>,
}

impl ConsoleTransport<std::io::Stdout> {
    pub fn stdout(channel: ChannelId, guild: GuildId, default_user: UserId) -> Self {
        Self::new(channel, guild, default_user, std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(channel: ChannelId, guild: GuildId, default_user: UserId, out: W) -> Self {
        Self {
            channel,
            guild,
            default_user,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
            out: Mutex::new(out),
        }
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Turn an input line into a message in the helpdesk channel. Blank
    /// lines yield nothing.
    pub fn parse_line(&self, line: &str) -> Option<InboundMessage> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let (author, content) = match line.split_once(':') {
            Some((user, text)) => match user.trim().parse::<u64>() {
                Ok(user) => (UserId(user), text.strip_prefix(' ').unwrap_or(text)),
                Err(_) => (self.default_user, line),
            },
            None => (self.default_user, line),
        };

        let id = self.next_message_id();
        lock(&self.live).insert(id);
        Some(InboundMessage::new(id, author, self.channel, content))
    }

    fn print(&self, line: &str) -> Result<(), TransportError> {
        let mut out = lock(&self.out);
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::BrokenPipe => TransportError::network(e.to_string()),
                _ => TransportError::unknown(e.to_string()),
            })
    }
}

#[async_trait]
impl<W: Write + Send> Transport for ConsoleTransport<W> {
    fn resolve_channel(&self, id: ChannelId) -> Option<Channel> {
        (id == self.channel).then_some(Channel {
            id,
            guild: self.guild,
        })
    }

    async fn send_message(
        &self,
        channel: &Channel,
        content: &str,
    ) -> Result<MessageId, TransportError> {
        if channel.id != self.channel {
            return Err(TransportError::not_found(format!("unknown channel {}", channel.id)));
        }
        let id = self.next_message_id();
        self.print(&format!("[#{id}] {}", content.trim_end()))?;
        lock(&self.live).insert(id);
        Ok(id)
    }

    async fn purge(
        &self,
        _channel: &Channel,
        ids: &[MessageId],
    ) -> Vec<(MessageId, Result<(), TransportError>)> {
        ids.iter()
            .map(|id| {
                let result = if lock(&self.live).remove(id) {
                    self.print(&format!("(deleted #{id})"))
                } else {
                    Err(TransportError::not_found(format!("unknown message {id}")))
                };
                (*id, result)
            })
            .collect()
    }
}

#[async_trait]
impl<W: Write + Send> GuildDirectory for ConsoleTransport<W> {
    fn resolve_role(&self, guild: GuildId, role: RoleId) -> Option<Role> {
        (guild == self.guild).then(|| Role {
            id: role,
            guild,
            name: format!("role-{role}"),
        })
    }

    fn resolve_member(&self, guild: GuildId, user: UserId) -> Option<Member> {
        (guild == self.guild).then_some(Member { user, guild })
    }

    async fn assign_role(&self, member: &Member, role: &Role) -> Result<(), TransportError> {
        self.print(&format!("(granted {} to user {})", role.name, member.user))
    }

    async fn remove_role(&self, member: &Member, role: &Role) -> Result<(), TransportError> {
        self.print(&format!("(removed {} from user {})", role.name, member.user))
    }
}
