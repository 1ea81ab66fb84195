// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM cancel a [`CancellationToken`] that the receive
//! loop monitors. In-flight events are then drained with a time limit.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal arrives. If the SIGTERM
/// handler cannot be installed, only Ctrl+C is watched.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => trigger.cancel(),
            _ = trigger.cancelled() => {}
        }
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, watching Ctrl+C only");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            // Without a signal source, only an explicit cancel stops the loop.
            std::future::pending::<()>().await;
        }
    }
}

/// Waits up to `grace` for every tracked worker to finish.
///
/// Returns `false` when the grace period expired with work still running.
pub async fn drain_workers(tracker: &TaskTracker, grace: Duration) -> bool {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight events to drain");
        return true;
    }

    info!(workers = tracker.len(), "waiting for in-flight events");
    match tokio::time::timeout(grace, tracker.wait()).await {
        Ok(()) => {
            info!("all in-flight events drained");
            true
        }
        Err(_) => {
            warn!(
                remaining = tracker.len(),
                grace_secs = grace.as_secs(),
                "grace period expired, abandoning in-flight events"
            );
            false
        }
    }
}
