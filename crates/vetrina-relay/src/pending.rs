// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-post registry: caption-less media waiting for a caption.
//!
//! Each conversation owns a FIFO queue of slots bounded by `capacity`. A
//! caption pairs with the oldest live slot. With capacity 1 a new slot
//! replaces the previous one. Every slot carries a TTL timer; an expired slot
//! is discarded unpublished.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use vetrina_core::types::{ConversationId, InboundItem, LogicalPost, MediaItem};

use crate::timer::{TimerFired, arm};

struct PendingSlot {
    id: u64,
    media: Vec<MediaItem>,
    created: Instant,
    timer: JoinHandle<()>,
}

/// Owns every pending slot.
pub struct PendingRegistry {
    ttl: Duration,
    capacity: usize,
    next_id: u64,
    slots: HashMap<ConversationId, VecDeque<PendingSlot>>,
    timers: mpsc::UnboundedSender<TimerFired>,
}

impl PendingRegistry {
    pub fn new(ttl: Duration, capacity: usize, timers: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            next_id: 0,
            slots: HashMap::new(),
            timers,
        }
    }

    /// Parks media until a caption arrives.
    ///
    /// Returns the media of the slot evicted to make room, if any.
    pub fn remember(
        &mut self,
        conversation: ConversationId,
        media: Vec<MediaItem>,
    ) -> Option<Vec<MediaItem>> {
        let id = self.next_id;
        self.next_id += 1;

        let queue = self.slots.entry(conversation).or_default();
        let evicted = if queue.len() >= self.capacity {
            queue.pop_front().map(|slot| {
                slot.timer.abort();
                debug!(%conversation, slot = slot.id, "pending slot evicted by newer media");
                slot.media
            })
        } else {
            None
        };

        let timer = arm(
            self.ttl,
            self.timers.clone(),
            TimerFired::SlotExpired {
                conversation,
                slot: id,
            },
        );
        debug!(%conversation, slot = id, media = media.len(), "media waiting for caption");
        queue.push_back(PendingSlot {
            id,
            media,
            created: Instant::now(),
            timer,
        });
        evicted
    }

    /// Pairs a text event with the oldest live slot of its conversation.
    ///
    /// Without an eligible slot the text becomes a standalone text post.
    pub fn match_caption(&mut self, text: &InboundItem) -> LogicalPost {
        let caption = text.caption_text().map(str::to_string);
        let conversation = text.conversation;

        while let Some(slot) = self.pop_oldest(conversation) {
            slot.timer.abort();
            if slot.created.elapsed() >= self.ttl {
                debug!(%conversation, slot = slot.id, "pending slot expired before pairing");
                crate::metrics::record_pending_expired();
                continue;
            }
            debug!(%conversation, slot = slot.id, caption_seq = text.sequence, "caption paired");
            return LogicalPost::merge(conversation, slot.media, caption, &[text.sequence]);
        }

        LogicalPost::merge(conversation, Vec::new(), caption, &[text.sequence])
    }

    /// Drops the slot if it is still pending. Returns whether anything was dropped.
    pub fn expire(&mut self, conversation: ConversationId, slot: u64) -> bool {
        let Some(queue) = self.slots.get_mut(&conversation) else {
            return false;
        };
        let Some(index) = queue.iter().position(|s| s.id == slot) else {
            return false;
        };
        let expired = queue.remove(index);
        if queue.is_empty() {
            self.slots.remove(&conversation);
        }
        if let Some(expired) = expired {
            debug!(
                %conversation,
                slot,
                media = expired.media.len(),
                "pending media expired without a caption"
            );
            crate::metrics::record_pending_expired();
        }
        true
    }

    /// Cancels every TTL timer and drops all slots. Returns how many were dropped.
    pub fn shutdown(&mut self) -> usize {
        let mut dropped = 0;
        for (_, queue) in self.slots.drain() {
            for slot in queue {
                slot.timer.abort();
                dropped += 1;
            }
        }
        dropped
    }

    /// Number of slots pending across all conversations.
    pub fn len(&self) -> usize {
        self.slots.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn pop_oldest(&mut self, conversation: ConversationId) -> Option<PendingSlot> {
        let queue = self.slots.get_mut(&conversation)?;
        let slot = queue.pop_front();
        if queue.is_empty() {
            self.slots.remove(&conversation);
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrina_core::types::{MediaKind, MediaRef};

    const CHAT: ConversationId = ConversationId(1);

    fn photo(seq: i64) -> MediaItem {
        MediaItem {
            sequence: seq,
            kind: MediaKind::Photo,
            media: MediaRef(format!("p{seq}")),
        }
    }

    fn text(seq: i64, caption: &str) -> InboundItem {
        InboundItem {
            sequence: seq,
            conversation: CHAT,
            group: None,
            kind: MediaKind::Text,
            media: None,
            caption: Some(caption.into()),
        }
    }

    fn registry(capacity: usize) -> (PendingRegistry, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PendingRegistry::new(Duration::from_secs(30), capacity, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn caption_pairs_with_pending_media() {
        let (mut reg, _rx) = registry(1);
        reg.remember(CHAT, vec![photo(3), photo(1), photo(2)]);

        let post = reg.match_caption(&text(4, "900€ -10%"));
        assert_eq!(post.publish_sequence, 1);
        assert_eq!(post.media.len(), 3);
        assert_eq!(post.caption.as_deref(), Some("900€ -10%"));
        assert_eq!(post.sources, vec![1, 2, 3, 4]);
        assert!(reg.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn caption_without_slot_is_standalone_text() {
        let (mut reg, _rx) = registry(1);
        let post = reg.match_caption(&text(9, "300€ -20%"));
        assert!(post.media.is_empty());
        assert_eq!(post.publish_sequence, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn single_slot_replaces_previous_media() {
        let (mut reg, _rx) = registry(1);
        assert!(reg.remember(CHAT, vec![photo(1)]).is_none());
        let evicted = reg.remember(CHAT, vec![photo(2)]).unwrap();
        assert_eq!(evicted, vec![photo(1)]);

        let post = reg.match_caption(&text(3, "x"));
        assert_eq!(post.media, vec![photo(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_pairs_oldest_first() {
        let (mut reg, _rx) = registry(3);
        reg.remember(CHAT, vec![photo(1)]);
        reg.remember(CHAT, vec![photo(2)]);
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.match_caption(&text(3, "a")).media, vec![photo(1)]);
        assert_eq!(reg.match_caption(&text(4, "b")).media, vec![photo(2)]);
        assert!(reg.match_caption(&text(5, "c")).media.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn conversations_do_not_share_slots() {
        let (mut reg, _rx) = registry(1);
        reg.remember(ConversationId(2), vec![photo(1)]);
        assert!(reg.match_caption(&text(2, "x")).media.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_timer_expires_slot() {
        let (mut reg, mut rx) = registry(1);
        reg.remember(CHAT, vec![photo(1)]);

        let fired = rx.recv().await.unwrap();
        let TimerFired::SlotExpired { conversation, slot } = fired else {
            panic!("expected an expiry event");
        };
        assert!(reg.expire(conversation, slot));
        assert!(reg.is_empty());
        assert!(!reg.expire(conversation, slot));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_slot_is_not_paired_even_if_timer_is_late() {
        let (mut reg, _rx) = registry(1);
        reg.remember(CHAT, vec![photo(1)]);
        tokio::time::advance(Duration::from_secs(31)).await;

        // The expiry event may still be queued; pairing must not use the slot.
        let post = reg.match_caption(&text(2, "x"));
        assert!(post.media.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pairing_cancels_the_ttl_timer() {
        let (mut reg, mut rx) = registry(1);
        reg.remember(CHAT, vec![photo(1)]);
        reg.match_caption(&text(2, "x"));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_everything() {
        let (mut reg, _rx) = registry(2);
        reg.remember(CHAT, vec![photo(1)]);
        reg.remember(ConversationId(2), vec![photo(2)]);
        assert_eq!(reg.shutdown(), 2);
        assert!(reg.is_empty());
    }
}
