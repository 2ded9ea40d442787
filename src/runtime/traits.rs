//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the session runtime with mock implementations.

use crate::transport::{
    Channel, ChannelId, GuildId, Member, MessageId, Role, RoleId, TransportError, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Chat transport: channel lookup, sending and deleting messages
#[async_trait]
pub trait Transport: Send + Sync {
    /// Look up a channel in the transport's cache
    fn resolve_channel(&self, id: ChannelId) -> Option<Channel>;

    /// Send a message, returning its id
    async fn send_message(
        &self,
        channel: &Channel,
        content: &str,
    ) -> Result<MessageId, TransportError>;

    /// Delete messages in bulk; one result per requested id
    async fn purge(
        &self,
        channel: &Channel,
        ids: &[MessageId],
    ) -> Vec<(MessageId, Result<(), TransportError>)>;
}

/// Guild roles and members
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    fn resolve_role(&self, guild: GuildId, role: RoleId) -> Option<Role>;

    fn resolve_member(&self, guild: GuildId, user: UserId) -> Option<Member>;

    async fn assign_role(&self, member: &Member, role: &Role) -> Result<(), TransportError>;

    async fn remove_role(&self, member: &Member, role: &Role) -> Result<(), TransportError>;
}

/// Lifecycle service for roles that are only granted for a while
pub trait GrantRegistry: Send + Sync {
    /// Record that `member` now holds `role` temporarily; expiry is the
    /// registry's business
    fn register_temporary_grant(&self, member: &Member, role: &Role);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn resolve_channel(&self, id: ChannelId) -> Option<Channel> {
        (**self).resolve_channel(id)
    }

    async fn send_message(
        &self,
        channel: &Channel,
        content: &str,
    ) -> Result<MessageId, TransportError> {
        (**self).send_message(channel, content).await
    }

    async fn purge(
        &self,
        channel: &Channel,
        ids: &[MessageId],
    ) -> Vec<(MessageId, Result<(), TransportError>)> {
        (**self).purge(channel, ids).await
    }
}

#[async_trait]
impl<T: GuildDirectory + ?Sized> GuildDirectory for Arc<T> {
    fn resolve_role(&self, guild: GuildId, role: RoleId) -> Option<Role> {
        (**self).resolve_role(guild, role)
    }

    fn resolve_member(&self, guild: GuildId, user: UserId) -> Option<Member> {
        (**self).resolve_member(guild, user)
    }

    async fn assign_role(&self, member: &Member, role: &Role) -> Result<(), TransportError> {
        (**self).assign_role(member, role).await
    }

    async fn remove_role(&self, member: &Member, role: &Role) -> Result<(), TransportError> {
        (**self).remove_role(member, role).await
    }
}

impl<T: GrantRegistry + ?Sized> GrantRegistry for Arc<T> {
    fn register_temporary_grant(&self, member: &Member, role: &Role) {
        (**self).register_temporary_grant(member, role);
    }
}
