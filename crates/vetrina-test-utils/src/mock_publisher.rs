// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock publisher for deterministic testing.
//!
//! `MockPublisher` implements `Publisher` and captures every delivery, hint
//! and retraction for assertion in tests. Failures can be queued up front.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use vetrina_core::traits::adapter::PluginAdapter;
use vetrina_core::traits::publisher::Publisher;
use vetrina_core::types::{AdapterType, ConversationId, MediaItem, MediaRef, MessageId};
use vetrina_core::{PublishErrorKind, VetrinaError};

/// One captured delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Single { media: MediaRef, caption: String },
    Group { media: Vec<MediaRef>, caption: String },
    Text { caption: String },
}

impl Published {
    pub fn caption(&self) -> &str {
        match self {
            Published::Single { caption, .. }
            | Published::Group { caption, .. }
            | Published::Text { caption } => caption,
        }
    }

    /// Media refs as plain strings, empty for text posts.
    pub fn media(&self) -> Vec<&str> {
        match self {
            Published::Single { media, .. } => vec![media.0.as_str()],
            Published::Group { media, .. } => media.iter().map(|m| m.0.as_str()).collect(),
            Published::Text { .. } => Vec::new(),
        }
    }
}

/// A mock output destination.
pub struct MockPublisher {
    published: Arc<Mutex<Vec<Published>>>,
    hints: Arc<Mutex<Vec<(ConversationId, String)>>>,
    retracted: Arc<Mutex<Vec<(ConversationId, Vec<i64>)>>>,
    failures: Arc<Mutex<VecDeque<PublishErrorKind>>>,
    notify: Arc<Notify>,
    next_id: AtomicU64,
}

impl MockPublisher {
    /// Create a new mock publisher with empty captures.
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            hints: Arc::new(Mutex::new(Vec::new())),
            retracted: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Make the next delivery fail with the given error kind.
    pub async fn fail_next(&self, kind: PublishErrorKind) {
        self.failures.lock().await.push_back(kind);
    }

    /// Get all posts delivered so far, in delivery order.
    pub async fn published(&self) -> Vec<Published> {
        self.published.lock().await.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.published.lock().await.len()
    }

    pub async fn hints(&self) -> Vec<(ConversationId, String)> {
        self.hints.lock().await.clone()
    }

    pub async fn retracted(&self) -> Vec<(ConversationId, Vec<i64>)> {
        self.retracted.lock().await.clone()
    }

    /// Wait until at least `count` posts were delivered.
    pub async fn wait_for_published(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.published.lock().await.len() >= count {
                return;
            }
            notified.await;
        }
    }

    async fn deliver(&self, post: Published) -> Result<MessageId, VetrinaError> {
        if let Some(kind) = self.failures.lock().await.pop_front() {
            return Err(VetrinaError::Publish {
                kind,
                message: "injected failure".to_string(),
                source: None,
            });
        }
        self.published.lock().await.push(post);
        self.notify.notify_waiters();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(MessageId(format!("mock-msg-{id}")))
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPublisher {
    fn name(&self) -> &str {
        "mock-publisher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn send_single(
        &self,
        media: &MediaItem,
        caption: &str,
    ) -> Result<MessageId, VetrinaError> {
        self.deliver(Published::Single {
            media: media.media.clone(),
            caption: caption.to_string(),
        })
        .await
    }

    async fn send_group(
        &self,
        media: &[MediaItem],
        caption: &str,
    ) -> Result<Vec<MessageId>, VetrinaError> {
        let id = self
            .deliver(Published::Group {
                media: media.iter().map(|m| m.media.clone()).collect(),
                caption: caption.to_string(),
            })
            .await?;
        Ok(vec![id])
    }

    async fn send_text(&self, caption: &str) -> Result<MessageId, VetrinaError> {
        self.deliver(Published::Text {
            caption: caption.to_string(),
        })
        .await
    }

    async fn send_hint(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<(), VetrinaError> {
        self.hints
            .lock()
            .await
            .push((conversation, text.to_string()));
        Ok(())
    }

    async fn retract(
        &self,
        conversation: ConversationId,
        sequences: &[i64],
    ) -> Result<(), VetrinaError> {
        self.retracted
            .lock()
            .await
            .push((conversation, sequences.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrina_core::types::MediaKind;

    fn photo(seq: i64) -> MediaItem {
        MediaItem {
            sequence: seq,
            kind: MediaKind::Photo,
            media: MediaRef(format!("photo-{seq}")),
        }
    }

    #[tokio::test]
    async fn captures_deliveries_in_order() {
        let publisher = MockPublisher::new();
        publisher.send_single(&photo(1), "one").await.unwrap();
        publisher
            .send_group(&[photo(2), photo(3)], "two")
            .await
            .unwrap();
        publisher.send_text("three").await.unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 3);
        assert_eq!(published[0].media(), vec!["photo-1"]);
        assert_eq!(published[1].media(), vec!["photo-2", "photo-3"]);
        assert_eq!(published[2].caption(), "three");
    }

    #[tokio::test]
    async fn queued_failure_is_returned_once() {
        let publisher = MockPublisher::new();
        publisher.fail_next(PublishErrorKind::Permanent).await;

        let err = publisher.send_text("lost").await.unwrap_err();
        assert!(!err.is_transient());
        assert!(publisher.send_text("kept").await.is_ok());
        assert_eq!(publisher.published_count().await, 1);
    }

    #[tokio::test]
    async fn wait_for_published_wakes_on_delivery() {
        let publisher = Arc::new(MockPublisher::new());
        let clone = publisher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            clone.send_text("late").await.unwrap();
        });

        tokio::time::timeout(
            tokio::time::Duration::from_secs(2),
            publisher.wait_for_published(1),
        )
        .await
        .expect("delivery timed out");
    }

    #[tokio::test]
    async fn hints_and_retractions_are_captured() {
        let publisher = MockPublisher::new();
        publisher
            .send_hint(ConversationId(7), "no price")
            .await
            .unwrap();
        publisher.retract(ConversationId(7), &[1, 2]).await.unwrap();

        assert_eq!(
            publisher.hints().await,
            vec![(ConversationId(7), "no price".to_string())]
        );
        assert_eq!(
            publisher.retracted().await,
            vec![(ConversationId(7), vec![1, 2])]
        );
    }
}
