//! Role grants for nodes that carry one

use super::traits::{GrantRegistry, GuildDirectory, Transport};
use crate::transport::{ChannelId, RoleId, TransportError, UserId};

/// What became of a grant request
#[derive(Debug)]
pub enum GrantOutcome {
    Granted,
    ChannelMissing,
    RoleMissing,
    MemberMissing,
    AssignFailed(TransportError),
}

/// Grant `role` to `user` in the guild owning `channel` and register it as
/// temporary. Channel, role and member are resolved now, not when the
/// session started. Failures are logged and reported, never raised.
pub async fn grant_privilege<T, D, R>(
    transport: &T,
    directory: &D,
    grants: &R,
    user: UserId,
    channel: ChannelId,
    role: RoleId,
) -> GrantOutcome
where
    T: Transport + ?Sized,
    D: GuildDirectory + ?Sized,
    R: GrantRegistry + ?Sized,
{
    let Some(channel) = transport.resolve_channel(channel) else {
        tracing::warn!(channel = %channel, role = %role, "Where did the channel go?");
        return GrantOutcome::ChannelMissing;
    };

    let Some(role) = directory.resolve_role(channel.guild, role) else {
        tracing::warn!(guild = %channel.guild, role = %role, "Where did the role go?");
        return GrantOutcome::RoleMissing;
    };

    let Some(member) = directory.resolve_member(channel.guild, user) else {
        tracing::warn!(guild = %channel.guild, user = %user, "No member found for user");
        return GrantOutcome::MemberMissing;
    };

    if let Err(e) = directory.assign_role(&member, &role).await {
        tracing::error!(
            error = %e,
            user = %user,
            guild = %channel.guild,
            role = %role.id,
            "Failed to assign role"
        );
        return GrantOutcome::AssignFailed(e);
    }

    grants.register_temporary_grant(&member, &role);
    tracing::info!(user = %user, role = %role.id, role_name = %role.name, "Granted temporary role");
    GrantOutcome::Granted
}
