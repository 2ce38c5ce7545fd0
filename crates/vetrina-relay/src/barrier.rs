// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish ordering barrier.
//!
//! Posts are reserved when they are merged and resolved when their processing
//! finishes. Within a conversation the barrier releases resolved posts in
//! increasing sequence order and holds back everything behind an unresolved
//! head. Sequences are per-conversation counters, so conversations never wait
//! on each other. A head that stays unresolved longer than `max_hold` stops
//! blocking: the sweep releases the resolved posts behind it, and the late
//! head goes out on its own once it resolves.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use vetrina_core::types::ConversationId;

/// Ordering key: the source conversation and the publish sequence within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishKey {
    pub sequence: i64,
    pub conversation: ConversationId,
}

impl PublishKey {
    pub fn new(sequence: i64, conversation: ConversationId) -> Self {
        Self {
            sequence,
            conversation,
        }
    }
}

struct PublishTask<T> {
    payload: Option<T>,
    resolved: bool,
    reserved_at: Instant,
    overdue: bool,
}

impl<T> PublishTask<T> {
    fn reserved(now: Instant) -> Self {
        Self {
            payload: None,
            resolved: false,
            reserved_at: now,
            overdue: false,
        }
    }
}

/// Releases payloads in sequence order, per conversation.
pub struct OrderingBarrier<T> {
    lanes: HashMap<ConversationId, BTreeMap<i64, PublishTask<T>>>,
    max_hold: Duration,
}

impl<T> OrderingBarrier<T> {
    pub fn new(max_hold: Duration) -> Self {
        Self {
            lanes: HashMap::new(),
            max_hold,
        }
    }

    /// Registers an unresolved task. Reserving an existing key is a no-op.
    pub fn reserve(&mut self, key: PublishKey, now: Instant) {
        self.lanes
            .entry(key.conversation)
            .or_default()
            .entry(key.sequence)
            .or_insert_with(|| PublishTask::reserved(now));
    }

    /// Resolves a task and returns everything its conversation can release
    /// now, in order.
    ///
    /// A `None` payload resolves the task without producing output. Submitting
    /// a key that was never reserved inserts it resolved.
    pub fn submit(&mut self, key: PublishKey, payload: Option<T>, now: Instant) -> Vec<T> {
        let lane = self.lanes.entry(key.conversation).or_default();
        let task = lane
            .entry(key.sequence)
            .or_insert_with(|| PublishTask::reserved(now));
        task.payload = payload;
        task.resolved = true;

        let released = if task.overdue {
            // The sweep already let later posts pass; publish this one alone.
            debug!(
                sequence = key.sequence,
                conversation = %key.conversation,
                "late post released out of order"
            );
            lane.remove(&key.sequence)
                .and_then(|t| t.payload)
                .into_iter()
                .collect()
        } else {
            release_ready(lane)
        };
        if lane.is_empty() {
            self.lanes.remove(&key.conversation);
        }
        released
    }

    /// Stops waiting on heads unresolved for longer than `max_hold` and
    /// releases the resolved tasks behind them.
    pub fn expire_stale(&mut self, now: Instant) -> Vec<T> {
        let mut conversations: Vec<ConversationId> = self.lanes.keys().copied().collect();
        conversations.sort();

        let mut released = Vec::new();
        for conversation in conversations {
            let Some(lane) = self.lanes.get_mut(&conversation) else {
                continue;
            };
            for (sequence, task) in lane.iter_mut() {
                if task.resolved || task.overdue {
                    continue;
                }
                if now.saturating_duration_since(task.reserved_at) < self.max_hold {
                    break;
                }
                warn!(
                    sequence,
                    %conversation,
                    "post unresolved past max hold; releasing later posts"
                );
                task.overdue = true;
            }
            released.extend(release_ready(lane));
            if lane.is_empty() {
                self.lanes.remove(&conversation);
            }
        }
        released
    }

    /// Releases every resolved task, conversation by conversation in sequence
    /// order, and abandons the unresolved ones.
    pub fn flush(&mut self) -> Vec<T> {
        let abandoned = self
            .lanes
            .values()
            .flat_map(BTreeMap::values)
            .filter(|t| !t.resolved)
            .count();
        if abandoned > 0 {
            warn!(abandoned, "unresolved posts abandoned at shutdown");
        }
        let mut lanes: Vec<_> = std::mem::take(&mut self.lanes).into_iter().collect();
        lanes.sort_by_key(|(conversation, _)| *conversation);
        lanes
            .into_iter()
            .flat_map(|(_, lane)| lane.into_values())
            .filter_map(|t| t.payload)
            .collect()
    }

    /// Lowest sequence of a conversation not yet released.
    pub fn next_expected(&self, conversation: ConversationId) -> Option<i64> {
        self.lanes
            .get(&conversation)
            .and_then(|lane| lane.keys().next().copied())
    }

    pub fn len(&self) -> usize {
        self.lanes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

/// Pops resolved tasks in order; overdue unresolved tasks are passed over.
fn release_ready<T>(lane: &mut BTreeMap<i64, PublishTask<T>>) -> Vec<T> {
    let mut ready = Vec::new();
    for (sequence, task) in lane.iter() {
        if task.resolved {
            ready.push(*sequence);
        } else if !task.overdue {
            break;
        }
    }
    ready
        .into_iter()
        .filter_map(|sequence| lane.remove(&sequence).and_then(|t| t.payload))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ConversationId = ConversationId(1);

    fn key(seq: i64) -> PublishKey {
        PublishKey::new(seq, CHAT)
    }

    fn barrier() -> OrderingBarrier<&'static str> {
        OrderingBarrier::new(Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn releases_in_sequence_order() {
        let now = Instant::now();
        let mut b = barrier();
        b.reserve(key(1), now);
        b.reserve(key(2), now);
        b.reserve(key(3), now);

        assert!(b.submit(key(3), Some("c"), now).is_empty());
        assert!(b.submit(key(2), Some("b"), now).is_empty());
        assert_eq!(b.submit(key(1), Some("a"), now), vec!["a", "b", "c"]);
        assert!(b.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_post_does_not_block() {
        let now = Instant::now();
        let mut b = barrier();
        b.reserve(key(1), now);
        b.reserve(key(2), now);

        assert!(b.submit(key(2), Some("b"), now).is_empty());
        assert_eq!(b.submit(key(1), None, now), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unreserved_submission_goes_straight_out() {
        let now = Instant::now();
        let mut b = barrier();
        assert_eq!(b.submit(key(5), Some("e"), now), vec!["e"]);
    }

    #[tokio::test(start_paused = true)]
    async fn next_expected_tracks_lowest_unreleased() {
        let now = Instant::now();
        let mut b = barrier();
        assert_eq!(b.next_expected(CHAT), None);
        b.reserve(key(4), now);
        b.reserve(key(2), now);
        assert_eq!(b.next_expected(CHAT), Some(2));
        b.submit(key(2), Some("b"), now);
        assert_eq!(b.next_expected(CHAT), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_head_stops_blocking_after_max_hold() {
        let start = Instant::now();
        let mut b = barrier();
        b.reserve(key(1), start);
        b.reserve(key(2), start);
        b.reserve(key(3), start);
        b.submit(key(2), Some("b"), start);

        assert!(b.expire_stale(start + Duration::from_secs(30)).is_empty());

        let later = start + Duration::from_secs(61);
        assert_eq!(b.expire_stale(later), vec!["b"]);
        // 3 is not yet resolved but also past max hold.
        assert_eq!(b.submit(key(3), Some("c"), later), vec!["c"]);
        // The late head is released alone when it finally resolves.
        assert_eq!(b.submit(key(1), Some("a"), later), vec!["a"]);
        assert!(b.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_stops_at_a_fresh_unresolved_task() {
        let start = Instant::now();
        let mut b = barrier();
        b.reserve(key(1), start);
        b.submit(key(2), Some("b"), start);
        let fresh = start + Duration::from_secs(50);
        b.reserve(key(3), fresh);
        b.submit(key(4), Some("d"), fresh);

        let later = start + Duration::from_secs(61);
        assert_eq!(b.expire_stale(later), vec!["b"]);
        assert_eq!(b.next_expected(CHAT), Some(1));
        assert_eq!(b.submit(key(3), Some("c"), later), vec!["c", "d"]);
        assert!(b.submit(key(1), None, later).is_empty());
        assert!(b.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn conversations_release_independently() {
        let now = Instant::now();
        let mut b = barrier();
        let other = ConversationId(2);
        b.reserve(PublishKey::new(1000, other), now);
        b.reserve(key(5000), now);

        // A pending post in another chat never holds this one back.
        assert_eq!(b.submit(key(5000), Some("mine"), now), vec!["mine"]);
        assert_eq!(b.next_expected(CHAT), None);
        assert_eq!(b.next_expected(other), Some(1000));
        assert_eq!(b.len(), 1);

        assert_eq!(
            b.submit(PublishKey::new(1000, other), Some("other"), now),
            vec!["other"]
        );
        assert!(b.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_conversation_keeps_its_own_order() {
        let now = Instant::now();
        let mut b = barrier();
        let other = ConversationId(2);
        b.reserve(key(1), now);
        b.reserve(key(2), now);
        b.reserve(PublishKey::new(7, other), now);
        b.reserve(PublishKey::new(8, other), now);

        assert!(b.submit(key(2), Some("b"), now).is_empty());
        assert!(b.submit(PublishKey::new(8, other), Some("y"), now).is_empty());
        assert_eq!(b.submit(PublishKey::new(7, other), Some("x"), now), vec!["x", "y"]);
        assert_eq!(b.submit(key(1), Some("a"), now), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_head_only_unblocks_its_own_conversation() {
        let start = Instant::now();
        let mut b = barrier();
        let other = ConversationId(2);
        b.reserve(key(1), start);
        b.submit(key(2), Some("b"), start);
        let fresh = start + Duration::from_secs(50);
        b.reserve(PublishKey::new(1, other), fresh);
        b.submit(PublishKey::new(2, other), Some("y"), fresh);

        let later = start + Duration::from_secs(61);
        assert_eq!(b.expire_stale(later), vec!["b"]);
        assert_eq!(b.next_expected(other), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_releases_resolved_and_abandons_rest() {
        let now = Instant::now();
        let mut b = barrier();
        b.reserve(key(1), now);
        b.submit(key(2), Some("b"), now);
        b.submit(key(3), Some("c"), now);
        assert_eq!(b.flush(), vec!["b", "c"]);
        assert!(b.is_empty());
    }
}
