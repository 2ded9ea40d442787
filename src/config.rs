//! Bot configuration from the environment

use crate::transport::{ChannelId, GuildId};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL_PATH: &str = "helpdesk.yaml";
const DEFAULT_CHANNEL_ID: u64 = 1;
const DEFAULT_GUILD_ID: u64 = 1;
const DEFAULT_EXPIRE_MINUTES: u64 = 5;
const DEFAULT_ROLE_HOURS: u64 = 24;
const DEFAULT_SWEEP_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Helpdesk model file (YAML or JSON)
    pub model_path: PathBuf,
    pub helpdesk_channel: ChannelId,
    pub guild: GuildId,
    /// How long each wait for a reply lasts
    pub expire_after: Duration,
    /// How long a granted role is kept
    pub role_duration: chrono::Duration,
    /// How often expired roles are revoked
    pub sweep_interval: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            helpdesk_channel: ChannelId(DEFAULT_CHANNEL_ID),
            guild: GuildId(DEFAULT_GUILD_ID),
            expire_after: minutes(DEFAULT_EXPIRE_MINUTES),
            role_duration: hours(DEFAULT_ROLE_HOURS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECONDS),
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid numbers fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str, default: u64| parse_or(&lookup, key, default);

        Self {
            model_path: lookup("HELPDESK_MODEL_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from),
            helpdesk_channel: ChannelId(number("HELPDESK_CHANNEL_ID", DEFAULT_CHANNEL_ID)),
            guild: GuildId(number("HELPDESK_GUILD_ID", DEFAULT_GUILD_ID)),
            expire_after: minutes(number("HELPDESK_EXPIRE_MINUTES", DEFAULT_EXPIRE_MINUTES)),
            role_duration: hours(number("HELPDESK_ROLE_HOURS", DEFAULT_ROLE_HOURS)),
            sweep_interval: Duration::from_secs(
                number("HELPDESK_SWEEP_SECONDS", DEFAULT_SWEEP_SECONDS).max(1),
            ),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, default = %default, "Invalid configuration value, using default");
        default
    })
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}

fn hours(n: u64) -> chrono::Duration {
    i64::try_from(n)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .unwrap_or(chrono::Duration::MAX)
}
