// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-post processing: price the caption, filter the media, build the payload.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vetrina_core::traits::Publisher;
use vetrina_core::types::{LogicalPost, OutboundPost, PublishPayload};
use vetrina_pricing::{MISSING_PRICE_HINT, Pricer};

use crate::tagfilter::PriceTagFilter;

/// Turns merged logical posts into outbound posts.
pub struct PostProcessor {
    pricer: Pricer,
    tag_filter: Option<PriceTagFilter>,
    publisher: Arc<dyn Publisher>,
    hint_on_miss: bool,
}

impl PostProcessor {
    pub fn new(
        pricer: Pricer,
        tag_filter: Option<PriceTagFilter>,
        publisher: Arc<dyn Publisher>,
        hint_on_miss: bool,
    ) -> Self {
        Self {
            pricer,
            tag_filter,
            publisher,
            hint_on_miss,
        }
    }

    /// Returns `None` when the post must not be published.
    pub async fn process(&self, post: LogicalPost) -> Option<OutboundPost> {
        let caption = post.caption.as_deref().unwrap_or_default();
        let Some(quote) = self.pricer.quote(caption) else {
            self.on_missing_price(&post).await;
            return None;
        };

        let media = match &self.tag_filter {
            Some(filter) if post.is_album() => {
                let outcome = filter.filter(post.media).await;
                if outcome.hidden > 0 {
                    crate::metrics::record_hidden(outcome.hidden);
                }
                outcome.kept
            }
            _ => post.media,
        };

        debug!(
            sequence = post.publish_sequence,
            media = media.len(),
            final_price = quote.final_price,
            "post ready"
        );
        Some(OutboundPost {
            publish_sequence: post.publish_sequence,
            origin: post.conversation,
            sources: post.sources,
            payload: PublishPayload::from_parts(media, quote.caption),
        })
    }

    async fn on_missing_price(&self, post: &LogicalPost) {
        if post.media.is_empty() {
            debug!(sequence = post.publish_sequence, "text without a price ignored");
            return;
        }
        info!(
            sequence = post.publish_sequence,
            conversation = %post.conversation,
            "no price found in caption; post skipped"
        );
        if self.hint_on_miss
            && let Err(e) = self
                .publisher
                .send_hint(post.conversation, MISSING_PRICE_HINT)
                .await
        {
            warn!(conversation = %post.conversation, error = %e, "failed to send price hint");
        }
    }
}
