//! In-memory lifecycle for roles granted for a limited time
//!
//! Grants are recorded with an expiry; a sweeper task periodically removes
//! expired roles from their members. Nothing survives a restart.

use crate::runtime::{GrantRegistry, GuildDirectory};
use crate::transport::{GuildId, Member, Role, RoleId, UserId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A role held by a member until `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryGrant {
    pub member: Member,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

type GrantKey = (GuildId, UserId, RoleId);

pub struct TemporaryRoleService {
    role_duration: Duration,
    grants: Mutex<HashMap<GrantKey, TemporaryGrant>>,
}

impl TemporaryRoleService {
    pub fn new(role_duration: Duration) -> Self {
        Self {
            role_duration,
            grants: Mutex::new(HashMap::new()),
        }
    }

    fn grants(&self) -> MutexGuard<'_, HashMap<GrantKey, TemporaryGrant>> {
        self.grants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a grant made at `now`. Granting a held role again extends it.
    pub fn register_at(&self, member: &Member, role: &Role, now: DateTime<Utc>) -> DateTime<Utc> {
        let expires_at = now
            .checked_add_signed(self.role_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.grants().insert(
            (member.guild, member.user, role.id),
            TemporaryGrant {
                member: member.clone(),
                role: role.clone(),
                expires_at,
            },
        );
        expires_at
    }

    /// Forget and return every grant due at `now`, soonest first
    pub fn take_expired(&self, now: DateTime<Utc>) -> Vec<TemporaryGrant> {
        let mut grants = self.grants();
        let due: Vec<GrantKey> = grants
            .iter()
            .filter(|(_, g)| g.expires_at <= now)
            .map(|(key, _)| *key)
            .collect();
        let mut expired: Vec<TemporaryGrant> =
            due.iter().filter_map(|key| grants.remove(key)).collect();
        expired.sort_by_key(|g| g.expires_at);
        expired
    }

    /// Grants not yet revoked
    pub fn active(&self) -> usize {
        self.grants().len()
    }

    /// Remove every role due at `now` from its member. Returns how many were
    /// removed successfully; failures are logged and dropped.
    pub async fn revoke_expired<D>(&self, directory: &D, now: DateTime<Utc>) -> usize
    where
        D: GuildDirectory + ?Sized,
    {
        let mut revoked = 0;
        for grant in self.take_expired(now) {
            match directory.remove_role(&grant.member, &grant.role).await {
                Ok(()) => {
                    revoked += 1;
                    tracing::info!(
                        user = %grant.member.user,
                        guild = %grant.member.guild,
                        role = %grant.role.id,
                        role_name = %grant.role.name,
                        "Revoked expired temporary role"
                    );
                }
                Err(e) => tracing::error!(
                    error = %e,
                    user = %grant.member.user,
                    guild = %grant.member.guild,
                    role = %grant.role.id,
                    "Failed to revoke temporary role"
                ),
            }
        }
        revoked
    }

    /// Revoke expired roles every `interval` until `cancel` fires
    pub fn spawn_sweeper<D>(
        self: Arc<Self>,
        directory: Arc<D>,
        interval: std::time::Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        D: GuildDirectory + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.revoke_expired(&*directory, Utc::now()).await;
                    }
                    () = cancel.cancelled() => {
                        tracing::debug!(pending = self.active(), "Temporary role sweeper stopped");
                        break;
                    }
                }
            }
        })
    }
}

impl GrantRegistry for TemporaryRoleService {
    fn register_temporary_grant(&self, member: &Member, role: &Role) {
        let expires_at = self.register_at(member, role, Utc::now());
        tracing::debug!(
            user = %member.user,
            role = %role.id,
            expires_at = %expires_at,
            "Registered temporary role"
        );
    }
}
