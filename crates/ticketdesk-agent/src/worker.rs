// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user workers.
//!
//! Each user with pending events gets one worker task fed by a bounded queue, so
//! events of one user are handled strictly in arrival order while different
//! users proceed in parallel. The receive loop never waits on a queue: events
//! for a user whose queue is full are turned away.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use ticketdesk_conversation::ConversationMachine;
use ticketdesk_core::ChannelAdapter;
use ticketdesk_core::types::{ChatId, InboundEvent, Outbound, UserId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, warn};

/// Handle to a running worker, owned by the receive loop.
#[derive(Clone)]
pub(crate) struct WorkerHandle {
    tx: mpsc::Sender<InboundEvent>,
    /// Events sent to the worker and not yet fully handled.
    pending: Arc<AtomicUsize>,
    /// Set once the user has been told the queue is full, cleared when it drains.
    busy_notified: Arc<AtomicBool>,
}

/// Why an event was not queued.
pub(crate) enum Rejected {
    Full(InboundEvent),
    Gone(InboundEvent),
}

impl WorkerHandle {
    pub(crate) fn spawn(
        user: UserId,
        capacity: usize,
        machine: Arc<ConversationMachine>,
        channel: Arc<dyn ChannelAdapter>,
        tracker: &TaskTracker,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<InboundEvent>(capacity);
        let pending = Arc::new(AtomicUsize::new(0));
        let busy_notified = Arc::new(AtomicBool::new(false));
        let in_flight = pending.clone();
        let notified = busy_notified.clone();

        tracker.spawn(
            async move {
                debug!(user_id = %user, "worker started");
                while let Some(event) = rx.recv().await {
                    process_event(&machine, channel.as_ref(), event).await;
                    if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                        notified.store(false, Ordering::SeqCst);
                    }
                }
                debug!(user_id = %user, "worker stopped");
            }
            .in_current_span(),
        );

        Self {
            tx,
            pending,
            busy_notified,
        }
    }

    /// Queue an event without waiting. A full queue or a dead worker gives the
    /// event back.
    pub(crate) fn try_submit(&self, event: InboundEvent) -> Result<(), Rejected> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(match e {
                    TrySendError::Full(event) => Rejected::Full(event),
                    TrySendError::Closed(event) => Rejected::Gone(event),
                })
            }
        }
    }

    /// True the first time it is called after the queue last drained.
    pub(crate) fn should_notify_busy(&self) -> bool {
        !self.busy_notified.swap(true, Ordering::SeqCst)
    }

    /// Nothing queued and nothing being handled. Only the receive loop submits,
    /// so an idle worker stays idle until the loop sends to it again.
    pub(crate) fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }
}

/// Handle one event and deliver its replies. A panic inside the state machine
/// ends this event only; the user gets no reply.
pub(crate) async fn process_event(
    machine: &ConversationMachine,
    channel: &dyn ChannelAdapter,
    event: InboundEvent,
) {
    let user = event.user_id;
    match AssertUnwindSafe(machine.handle(&event)).catch_unwind().await {
        Ok(replies) => deliver(channel, event.chat_id, replies).await,
        Err(panic) => {
            error!(
                user_id = %user,
                panic = %panic_message(panic.as_ref()),
                "event handler panicked"
            );
        }
    }
}

/// Send replies in order. Failures are logged and never reported back to the user.
pub(crate) async fn deliver(
    channel: &dyn ChannelAdapter,
    chat_id: ChatId,
    replies: Vec<Outbound>,
) {
    for outbound in replies {
        match outbound {
            Outbound::Text(reply) => {
                if let Err(e) = channel.send(chat_id, &reply).await {
                    warn!(chat_id = %chat_id, error = %e, "reply delivery failed");
                }
            }
            Outbound::Image(image) => {
                let Err(e) = channel.send_image(chat_id, &image).await else {
                    continue;
                };
                warn!(
                    chat_id = %chat_id,
                    file = %image.file_ref,
                    error = %e,
                    "image delivery failed"
                );
                if let Some(fallback) = &image.fallback {
                    if let Err(e) = channel.send(chat_id, fallback).await {
                        warn!(chat_id = %chat_id, error = %e, "fallback delivery failed");
                    }
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
