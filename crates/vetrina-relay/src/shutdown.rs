// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven shutdown.
//!
//! SIGINT or SIGTERM cancels a [`CancellationToken`] shared by the relay
//! pipeline and the inbound poller. The pipeline then drains in-flight posts
//! before the process exits.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolves with the name of the first termination signal received.
async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler; only Ctrl+C stops the relay");
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl+C"
    }
}

/// Spawns the signal listener and returns the token it cancels.
///
/// Cancelling the token directly also ends the listener.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let listener = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                info!(signal, "shutdown requested");
                listener.cancel();
            }
            _ = listener.cancelled() => {}
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
