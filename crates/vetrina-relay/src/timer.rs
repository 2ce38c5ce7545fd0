// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable one-shot timers that report back to the pipeline actor.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vetrina_core::types::{ConversationId, GroupId};

/// Key of an album bucket.
pub type BucketKey = (ConversationId, GroupId);

/// A timer that ran to completion.
///
/// The generation/slot id identifies which arming of the timer fired, so a
/// fire that raced with its own cancellation can be recognised and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerFired {
    AlbumSettled { key: BucketKey, generation: u64 },
    SlotExpired { conversation: ConversationId, slot: u64 },
}

/// Sends `event` on `tx` after `after`, unless the returned handle is aborted first.
pub(crate) fn arm(
    after: Duration,
    tx: mpsc::UnboundedSender<TimerFired>,
    event: TimerFired,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        // The actor is gone during shutdown; nothing left to notify.
        let _ = tx.send(event);
    })
}
