//! Helpdesk bot - guided support conversations
//!
//! Walks users through a decision tree of numbered choices, grants
//! temporary roles at nodes that carry one, and deletes the whole
//! conversation once it ends.

mod config;
mod helpdesk;
mod runtime;
mod session;
mod temporary_roles;
mod transport;

use config::BotConfig;
use helpdesk::DialogueTree;
use runtime::{SessionConfig, SessionManager};
use std::collections::HashSet;
use std::sync::Arc;
use temporary_roles::TemporaryRoleService;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::console::ConsoleTransport;
use transport::UserId;

/// Author of console lines without a `<user id>:` prefix
const CONSOLE_USER: UserId = UserId(1000);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the console transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env();

    tracing::info!(path = %config.model_path.display(), "Loading helpdesk model");
    let tree = Arc::new(DialogueTree::load(&config.model_path)?);
    let dangling = tree.dangling_branches().len();
    if dangling > 0 {
        tracing::warn!(dangling, "Helpdesk model has branches leading nowhere");
    }

    let console = Arc::new(ConsoleTransport::stdout(
        config.helpdesk_channel,
        config.guild,
        CONSOLE_USER,
    ));

    // Temporary roles
    let roles = Arc::new(TemporaryRoleService::new(config.role_duration));
    let shutdown = CancellationToken::new();
    let sweeper = Arc::clone(&roles).spawn_sweeper(
        Arc::clone(&console),
        config.sweep_interval,
        shutdown.clone(),
    );

    let manager = SessionManager::new(
        tree,
        Arc::clone(&console),
        Arc::clone(&console),
        roles,
        SessionConfig {
            helpdesk_channels: HashSet::from([config.helpdesk_channel]),
            wait_timeout: config.expire_after,
        },
    );

    tracing::info!(
        channel = %config.helpdesk_channel,
        guild = %config.guild,
        expire_secs = config.expire_after.as_secs(),
        "Helpdesk bot listening on stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Some(message) = console.parse_line(&line) {
                        manager.handle_message(message).await;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    tracing::info!(sessions = manager.active_sessions().await, "Shutting down");
    manager.cancel_all().await;
    shutdown.cancel();
    sweeper.await?;

    Ok(())
}
