// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Album aggregation behind a debounced settle window.
//!
//! Media items that share a group id arrive as independent events. Each
//! arrival restarts the bucket's settle timer; when the timer fires without a
//! newer arrival the bucket is flushed as one album.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vetrina_core::types::{ConversationId, GroupId, InboundItem, MediaItem};

use crate::timer::{BucketKey, TimerFired, arm};

/// A settled album: members sorted by sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub conversation: ConversationId,
    pub group: GroupId,
    pub items: Vec<InboundItem>,
    /// First caption found among the members, in sequence order.
    pub caption: Option<String>,
}

impl Album {
    pub fn media(&self) -> Vec<MediaItem> {
        self.items.iter().filter_map(InboundItem::media_item).collect()
    }
}

struct Bucket {
    items: Vec<InboundItem>,
    generation: u64,
    timer: JoinHandle<()>,
}

/// Owns every open album bucket.
pub struct AlbumAggregator {
    window: Duration,
    buckets: HashMap<BucketKey, Bucket>,
    timers: mpsc::UnboundedSender<TimerFired>,
}

impl AlbumAggregator {
    pub fn new(window: Duration, timers: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            window,
            buckets: HashMap::new(),
            timers,
        }
    }

    /// Adds a grouped item and re-arms the bucket's settle timer.
    ///
    /// Items without a group id are ignored with a warning.
    pub fn on_member(&mut self, item: InboundItem) {
        let Some(group) = item.group.clone() else {
            warn!(sequence = item.sequence, "ungrouped item offered to album aggregator");
            return;
        };
        let key = (item.conversation, group);

        let generation = self.buckets.get(&key).map_or(0, |b| b.generation + 1);
        let timer = arm(
            self.window,
            self.timers.clone(),
            TimerFired::AlbumSettled {
                key: key.clone(),
                generation,
            },
        );

        match self.buckets.get_mut(&key) {
            Some(bucket) => {
                bucket.timer.abort();
                bucket.timer = timer;
                bucket.generation = generation;
                bucket.items.push(item);
            }
            None => {
                debug!(conversation = %key.0, group = %key.1.0, "album bucket opened");
                self.buckets.insert(
                    key,
                    Bucket {
                        items: vec![item],
                        generation,
                        timer,
                    },
                );
            }
        }
    }

    /// Completes the bucket if `generation` is still its latest arming.
    pub fn flush(&mut self, key: &BucketKey, generation: u64) -> Option<Album> {
        match self.buckets.get(key) {
            Some(bucket) if bucket.generation == generation => {}
            Some(_) => {
                debug!(group = %key.1.0, generation, "stale settle timer ignored");
                return None;
            }
            None => return None,
        }

        let bucket = self.buckets.remove(key)?;
        let mut items = bucket.items;
        items.sort_by_key(|i| i.sequence);
        let caption = items
            .iter()
            .find_map(|i| i.caption_text().map(str::to_string));

        debug!(
            conversation = %key.0,
            group = %key.1.0,
            members = items.len(),
            captioned = caption.is_some(),
            "album settled"
        );
        Some(Album {
            conversation: key.0,
            group: key.1.clone(),
            items,
            caption,
        })
    }

    /// Cancels every settle timer and drops all buckets. Returns how many were dropped.
    pub fn shutdown(&mut self) -> usize {
        let dropped = self.buckets.len();
        for (_, bucket) in self.buckets.drain() {
            bucket.timer.abort();
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrina_core::types::{MediaKind, MediaRef};

    fn member(seq: i64, group: &str) -> InboundItem {
        InboundItem {
            sequence: seq,
            conversation: ConversationId(1),
            group: Some(GroupId(group.into())),
            kind: MediaKind::Photo,
            media: Some(MediaRef(format!("p{seq}"))),
            caption: None,
        }
    }

    fn aggregator() -> (AlbumAggregator, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AlbumAggregator::new(Duration::from_millis(1200), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn members_settle_into_one_sorted_album() {
        let (mut agg, mut rx) = aggregator();
        agg.on_member(member(12, "g"));
        agg.on_member(member(10, "g"));
        agg.on_member(member(11, "g"));

        let TimerFired::AlbumSettled { key, generation } = rx.recv().await.unwrap() else {
            panic!("expected a settle event");
        };
        assert_eq!(generation, 2);

        let album = agg.flush(&key, generation).unwrap();
        let seqs: Vec<i64> = album.items.iter().map(|i| i.sequence).collect();
        assert_eq!(seqs, vec![10, 11, 12]);
        assert!(agg.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_arrival_restarts_the_window() {
        let (mut agg, mut rx) = aggregator();
        agg.on_member(member(1, "g"));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        agg.on_member(member(2, "g"));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        // 2s after the first arrival, the first timer was superseded.
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await.unwrap();
        assert_eq!(
            fired,
            TimerFired::AlbumSettled {
                key: (ConversationId(1), GroupId("g".into())),
                generation: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_ignored() {
        let (mut agg, _rx) = aggregator();
        agg.on_member(member(1, "g"));
        agg.on_member(member(2, "g"));
        let key = (ConversationId(1), GroupId("g".into()));

        assert!(agg.flush(&key, 0).is_none());
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.flush(&key, 1).unwrap().items.len(), 2);
        assert!(agg.flush(&key, 1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_caption_in_sequence_order_wins() {
        let (mut agg, mut rx) = aggregator();
        let mut late = member(3, "g");
        late.caption = Some("second".into());
        let mut early = member(2, "g");
        early.caption = Some("first".into());
        agg.on_member(member(1, "g"));
        agg.on_member(late);
        agg.on_member(early);

        let TimerFired::AlbumSettled { key, generation } = rx.recv().await.unwrap() else {
            panic!("expected a settle event");
        };
        let album = agg.flush(&key, generation).unwrap();
        assert_eq!(album.caption.as_deref(), Some("first"));
        assert_eq!(album.media().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn groups_are_independent() {
        let (mut agg, mut rx) = aggregator();
        agg.on_member(member(1, "a"));
        agg.on_member(member(2, "b"));
        assert_eq!(agg.len(), 2);

        let mut settled = Vec::new();
        for _ in 0..2 {
            let TimerFired::AlbumSettled { key, generation } = rx.recv().await.unwrap() else {
                panic!("expected a settle event");
            };
            settled.push(agg.flush(&key, generation).unwrap().group.0);
        }
        settled.sort();
        assert_eq!(settled, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timers() {
        let (mut agg, mut rx) = aggregator();
        agg.on_member(member(1, "g"));
        assert_eq!(agg.shutdown(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
