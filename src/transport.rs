//! Chat transport domain types
//!
//! Identifiers, resolved entities and errors shared by the session engine
//! and every transport adapter.

pub mod console;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// A chat user
    UserId
);
snowflake!(
    /// A text channel
    ChannelId
);
snowflake!(
    /// A guild (server) owning channels, roles and members
    GuildId
);
snowflake!(
    /// A guild role
    RoleId
);
snowflake!(
    /// A single chat message
    MessageId
);

/// A message received from the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub author: UserId,
    pub channel: ChannelId,
    pub content: String,
    /// Messages from bots never start or drive a session
    pub author_is_bot: bool,
}

impl InboundMessage {
    pub fn new(
        id: impl Into<MessageId>,
        author: impl Into<UserId>,
        channel: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            channel: channel.into(),
            content: content.into(),
            author_is_bot: false,
        }
    }
}

/// A resolved text channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub guild: GuildId,
}

/// A resolved guild role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub guild: GuildId,
    pub name: String,
}

/// A resolved guild member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
    pub guild: GuildId,
}

/// Transport error with classification
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Forbidden, message)
    }

    #[allow(dead_code)] // Chat APIs throttle; the console never does
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::RateLimited, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Target entity (message, channel, member) no longer exists
    NotFound,
    /// Missing permissions
    Forbidden,
    RateLimited,
    Network,
    Unknown,
}
