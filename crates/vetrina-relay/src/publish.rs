// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish worker: delivers released posts one at a time, in release order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vetrina_core::VetrinaError;
use vetrina_core::traits::Publisher;
use vetrina_core::types::{OutboundPost, PublishPayload};

/// Delivers one post.
pub async fn deliver(publisher: &dyn Publisher, post: &OutboundPost) -> Result<(), VetrinaError> {
    match &post.payload {
        PublishPayload::Single { media, caption } => {
            publisher.send_single(media, caption).await?;
        }
        PublishPayload::Group { media, caption } => {
            publisher.send_group(media, caption).await?;
        }
        PublishPayload::Text { caption } => {
            publisher.send_text(caption).await?;
        }
    }
    Ok(())
}

fn shape(payload: &PublishPayload) -> &'static str {
    match payload {
        PublishPayload::Single { .. } => "single",
        PublishPayload::Group { .. } => "group",
        PublishPayload::Text { .. } => "text",
    }
}

/// Runs until the queue closes. Failures are reported once and skipped.
pub async fn run_publish_worker(
    mut queue: mpsc::UnboundedReceiver<OutboundPost>,
    publisher: Arc<dyn Publisher>,
    retract_originals: bool,
) {
    let mut delivered = 0u64;
    while let Some(post) = queue.recv().await {
        match deliver(publisher.as_ref(), &post).await {
            Ok(()) => {
                delivered += 1;
                crate::metrics::record_published(shape(&post.payload));
                debug!(
                    sequence = post.publish_sequence,
                    conversation = %post.origin,
                    media = post.payload.media_count(),
                    "post published"
                );
                if retract_originals
                    && let Err(e) = publisher.retract(post.origin, &post.sources).await
                {
                    warn!(
                        sequence = post.publish_sequence,
                        error = %e,
                        "failed to remove original messages"
                    );
                }
            }
            Err(e) => {
                let kind = match &e {
                    VetrinaError::Publish { kind, .. } => kind.to_string(),
                    _ => "other".to_string(),
                };
                crate::metrics::record_publish_failure(&kind);
                error!(
                    sequence = post.publish_sequence,
                    conversation = %post.origin,
                    error = %e,
                    "post could not be published; skipping"
                );
            }
        }
    }
    info!(delivered, "publish worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrina_core::PublishErrorKind;
    use vetrina_core::types::{ConversationId, MediaItem, MediaKind, MediaRef};
    use vetrina_test_utils::MockPublisher;

    fn text_post(seq: i64, caption: &str) -> OutboundPost {
        OutboundPost {
            publish_sequence: seq,
            origin: ConversationId(1),
            sources: vec![seq],
            payload: PublishPayload::Text {
                caption: caption.into(),
            },
        }
    }

    #[tokio::test]
    async fn delivers_in_queue_order_and_skips_failures() {
        let publisher = Arc::new(MockPublisher::new());
        publisher.fail_next(PublishErrorKind::Permanent).await;
        let (tx, rx) = mpsc::unbounded_channel();
        for (seq, caption) in [(1, "lost"), (2, "b"), (3, "c")] {
            tx.send(text_post(seq, caption)).unwrap();
        }
        drop(tx);

        run_publish_worker(rx, publisher.clone(), false).await;

        let captions: Vec<String> = publisher
            .published()
            .await
            .iter()
            .map(|p| p.caption().to_string())
            .collect();
        assert_eq!(captions, vec!["b", "c"]);
        assert!(publisher.retracted().await.is_empty());
    }

    #[tokio::test]
    async fn retracts_sources_after_success() {
        let publisher = Arc::new(MockPublisher::new());
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(OutboundPost {
            publish_sequence: 5,
            origin: ConversationId(9),
            sources: vec![5, 6],
            payload: PublishPayload::Single {
                media: MediaItem {
                    sequence: 5,
                    kind: MediaKind::Photo,
                    media: MediaRef("p5".into()),
                },
                caption: "x".into(),
            },
        })
        .unwrap();
        drop(tx);

        run_publish_worker(rx, publisher.clone(), true).await;

        assert_eq!(
            publisher.retracted().await,
            vec![(ConversationId(9), vec![5, 6])]
        );
    }
}
