// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ticketdesk serve` command implementation.
//!
//! Opens the SQLite ticket store, connects the Telegram channel and runs the
//! desk loop until a shutdown signal arrives.

use std::sync::Arc;

use ticketdesk_agent::{DeskLoop, LoopSettings, shutdown};
use ticketdesk_config::DeskConfig;
use ticketdesk_conversation::{ConversationMachine, MachineSettings};
use ticketdesk_core::{ChannelAdapter, DeskError, PluginAdapter, TicketStore};
use ticketdesk_storage::SqliteTicketStore;
use ticketdesk_telegram::TelegramChannel;
use tracing::{info, warn};

pub async fn run_serve(config: DeskConfig) -> Result<(), DeskError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting ticketdesk serve");

    let store = Arc::new(SqliteTicketStore::new(config.storage.clone()));
    store.initialize().await?;
    info!(path = %config.storage.database_path, "ticket store ready");

    let mut channel = TelegramChannel::new(config.telegram.clone())?;
    match channel.health_check().await? {
        ticketdesk_core::HealthStatus::Healthy => {}
        status => warn!(?status, "Telegram health check did not pass, polling anyway"),
    }
    channel.connect().await?;
    let media = Arc::new(channel.media());

    if config.telegram.allowed_users.is_empty() {
        warn!("telegram.allowed_users is empty, accepting messages from everyone");
    }

    let machine = Arc::new(ConversationMachine::new(
        store.clone(),
        media,
        MachineSettings::from_config(&config),
    ));
    let desk = DeskLoop::new(
        Arc::new(channel),
        machine,
        store,
        LoopSettings::from_config(&config.agent),
    );

    let cancel = shutdown::install_signal_handler();
    desk.run(cancel).await?;

    info!("ticketdesk stopped");
    Ok(())
}

/// Initialize the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ticketdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
