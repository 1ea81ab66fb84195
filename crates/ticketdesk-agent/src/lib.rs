// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event loop of the ticketdesk support bot.
//!
//! The [`DeskLoop`] receives events from a channel adapter and routes them to
//! per-user workers that run the conversation machine and deliver its replies.
//! On cancellation it stops receiving, drains the workers and closes the store.

pub mod shutdown;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use ticketdesk_config::model::AgentConfig;
use ticketdesk_conversation::ConversationMachine;
use ticketdesk_core::error::DeskError;
use ticketdesk_core::types::{ChatId, InboundEvent, Reply, UserId};
use ticketdesk_core::{ChannelAdapter, TicketStore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, warn};

use crate::worker::{Rejected, WorkerHandle};

/// How often idle workers are retired.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const BUSY_NOTICE: &str =
    "⏳ Предыдущие сообщения ещё обрабатываются. Пожалуйста, повторите чуть позже.";

/// Pause after a receive error that did not close the channel.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// Events buffered per user. Further events are dropped until it drains.
    pub queue_capacity: usize,
    pub shutdown_grace: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            queue_capacity: config.user_queue_capacity.max(1),
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

pub struct DeskLoop {
    channel: Arc<dyn ChannelAdapter>,
    machine: Arc<ConversationMachine>,
    store: Arc<dyn TicketStore>,
    settings: LoopSettings,
    workers: DashMap<UserId, WorkerHandle>,
    tracker: TaskTracker,
}

impl DeskLoop {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        machine: Arc<ConversationMachine>,
        store: Arc<dyn TicketStore>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            channel,
            machine,
            store,
            settings,
            workers: DashMap::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Number of users with a live worker.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Runs until `cancel` fires or the channel closes, then shuts down.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), DeskError> {
        info!(
            queue_capacity = self.settings.queue_capacity,
            "desk loop running"
        );
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping desk loop");
                    break;
                }
                received = self.channel.receive() => match received {
                    Ok(event) => self.dispatch(event),
                    Err(e) if is_closed(&e) => {
                        info!("inbound channel closed, stopping desk loop");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "channel receive error");
                        tokio::time::sleep(RECEIVE_BACKOFF).await;
                    }
                },
                _ = sweep.tick() => self.retire_idle_workers(),
            }
        }

        self.shutdown().await
    }

    /// Route an event to its user's worker, starting one if needed. Never waits,
    /// so a stalled user cannot hold up anyone else.
    fn dispatch(&self, mut event: InboundEvent) {
        let user = event.user_id;
        // A worker whose task died gives the event back; the retry starts a fresh one.
        for _ in 0..2 {
            let worker = self.worker_for(user);
            match worker.try_submit(event) {
                Ok(()) => return,
                Err(Rejected::Full(dropped)) => {
                    warn!(
                        user_id = %user,
                        capacity = self.settings.queue_capacity,
                        "user queue full, event dropped"
                    );
                    if worker.should_notify_busy() {
                        self.notify_busy(dropped.chat_id);
                    }
                    return;
                }
                Err(Rejected::Gone(returned)) => {
                    warn!(user_id = %user, "worker gone, restarting");
                    self.workers.remove(&user);
                    event = returned;
                }
            }
        }
        error!(user_id = %user, "event dropped, worker could not be started");
    }

    /// Tell the user to retry later, off the receive path.
    fn notify_busy(&self, chat_id: ChatId) {
        let channel = self.channel.clone();
        self.tracker.spawn(
            async move {
                let notice = Reply::plain(BUSY_NOTICE);
                if let Err(e) = channel.send(chat_id, &notice).await {
                    warn!(chat_id = %chat_id, error = %e, "busy notice delivery failed");
                }
            }
            .in_current_span(),
        );
    }

    fn worker_for(&self, user: UserId) -> WorkerHandle {
        self.workers
            .entry(user)
            .or_insert_with(|| {
                WorkerHandle::spawn(
                    user,
                    self.settings.queue_capacity,
                    self.machine.clone(),
                    self.channel.clone(),
                    &self.tracker,
                )
            })
            .clone()
    }

    fn retire_idle_workers(&self) {
        let before = self.workers.len();
        self.workers.retain(|_, worker| !worker.is_idle());
        let retired = before - self.workers.len();
        if retired > 0 {
            debug!(retired, remaining = self.workers.len(), "idle workers retired");
        }
    }

    async fn shutdown(&self) -> Result<(), DeskError> {
        // Dropping the senders lets each worker finish its queue and exit.
        self.workers.clear();
        shutdown::drain_workers(&self.tracker, self.settings.shutdown_grace).await;

        if let Err(e) = self.channel.shutdown().await {
            warn!(error = %e, "channel shutdown failed");
        }
        self.store.close().await?;
        info!("desk loop stopped");
        Ok(())
    }
}

fn is_closed(e: &DeskError) -> bool {
    matches!(e, DeskError::Channel { message, .. } if message.contains("closed"))
}
