// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the transport adapters and the relay pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a source or target conversation (Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform-assigned album identifier shared by all members of one media group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

/// Opaque handle the transport uses to re-send or download a media file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef(pub String);

/// Identifier of a message delivered to the target conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays around the relay pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Source,
    Publisher,
    Fetcher,
    Recognizer,
}

/// Kind of an inbound event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Text,
}

/// One event from the inbound chat stream. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundItem {
    /// Platform message id; monotonic within a conversation.
    pub sequence: i64,
    pub conversation: ConversationId,
    pub group: Option<GroupId>,
    pub kind: MediaKind,
    pub media: Option<MediaRef>,
    pub caption: Option<String>,
}

impl InboundItem {
    /// Caption text, `None` when absent or blank.
    pub fn caption_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Whether this event carries a photo or video.
    pub fn is_media(&self) -> bool {
        matches!(self.kind, MediaKind::Photo | MediaKind::Video) && self.media.is_some()
    }

    /// The media part of the event, if any.
    pub fn media_item(&self) -> Option<MediaItem> {
        if !self.is_media() {
            return None;
        }
        self.media.clone().map(|media| MediaItem {
            sequence: self.sequence,
            kind: self.kind,
            media,
        })
    }
}

/// A photo or video that belongs to a logical post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub sequence: i64,
    pub kind: MediaKind,
    pub media: MediaRef,
}

impl MediaItem {
    pub fn is_photo(&self) -> bool {
        self.kind == MediaKind::Photo
    }
}

/// Fully merged media + caption unit, ready for pricing and publication.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalPost {
    /// Smallest sequence among the constituent items. Fixed at merge time.
    pub publish_sequence: i64,
    pub conversation: ConversationId,
    pub media: Vec<MediaItem>,
    pub caption: Option<String>,
    /// Sequences of every inbound item merged into this post.
    pub sources: Vec<i64>,
}

impl LogicalPost {
    /// Builds a post from media and an optional caption-bearing text event.
    ///
    /// Media is sorted by sequence and the publish sequence is the minimum over
    /// all constituents.
    pub fn merge(
        conversation: ConversationId,
        mut media: Vec<MediaItem>,
        caption: Option<String>,
        extra_sources: &[i64],
    ) -> Self {
        media.sort_by_key(|m| m.sequence);
        let mut sources: Vec<i64> = media.iter().map(|m| m.sequence).collect();
        sources.extend_from_slice(extra_sources);
        sources.sort_unstable();
        sources.dedup();
        let publish_sequence = sources.first().copied().unwrap_or_default();
        Self {
            publish_sequence,
            conversation,
            media,
            caption,
            sources,
        }
    }

    pub fn is_album(&self) -> bool {
        self.media.len() > 1
    }
}

/// What the publisher should deliver for one logical post.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishPayload {
    Single { media: MediaItem, caption: String },
    Group { media: Vec<MediaItem>, caption: String },
    Text { caption: String },
}

impl PublishPayload {
    /// Picks the payload shape from the number of media items.
    pub fn from_parts(mut media: Vec<MediaItem>, caption: String) -> Self {
        match media.len() {
            0 => PublishPayload::Text { caption },
            1 => PublishPayload::Single {
                media: media.remove(0),
                caption,
            },
            _ => PublishPayload::Group { media, caption },
        }
    }

    pub fn media_count(&self) -> usize {
        match self {
            PublishPayload::Single { .. } => 1,
            PublishPayload::Group { media, .. } => media.len(),
            PublishPayload::Text { .. } => 0,
        }
    }

    pub fn caption(&self) -> &str {
        match self {
            PublishPayload::Single { caption, .. }
            | PublishPayload::Group { caption, .. }
            | PublishPayload::Text { caption } => caption,
        }
    }
}

/// A priced, filtered post released by the ordering barrier.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundPost {
    pub publish_sequence: i64,
    pub origin: ConversationId,
    pub sources: Vec<i64>,
    pub payload: PublishPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(seq: i64) -> MediaItem {
        MediaItem {
            sequence: seq,
            kind: MediaKind::Photo,
            media: MediaRef(format!("file-{seq}")),
        }
    }

    #[test]
    fn merge_sorts_media_and_takes_min_sequence() {
        let post = LogicalPost::merge(
            ConversationId(1),
            vec![photo(12), photo(10), photo(11)],
            Some("300€ -20%".into()),
            &[14],
        );
        assert_eq!(post.publish_sequence, 10);
        assert_eq!(
            post.media.iter().map(|m| m.sequence).collect::<Vec<_>>(),
            vec![10, 11, 12]
        );
        assert_eq!(post.sources, vec![10, 11, 12, 14]);
        assert!(post.is_album());
    }

    #[test]
    fn text_only_post_uses_text_sequence() {
        let post = LogicalPost::merge(ConversationId(1), vec![], Some("hi".into()), &[42]);
        assert_eq!(post.publish_sequence, 42);
        assert!(post.media.is_empty());
    }

    #[test]
    fn payload_shape_follows_media_count() {
        assert!(matches!(
            PublishPayload::from_parts(vec![], "x".into()),
            PublishPayload::Text { .. }
        ));
        assert!(matches!(
            PublishPayload::from_parts(vec![photo(1)], "x".into()),
            PublishPayload::Single { .. }
        ));
        let group = PublishPayload::from_parts(vec![photo(1), photo(2)], "x".into());
        assert_eq!(group.media_count(), 2);
        assert_eq!(group.caption(), "x");
    }

    #[test]
    fn blank_caption_is_absent() {
        let item = InboundItem {
            sequence: 1,
            conversation: ConversationId(5),
            group: None,
            kind: MediaKind::Photo,
            media: Some(MediaRef("f".into())),
            caption: Some("   ".into()),
        };
        assert_eq!(item.caption_text(), None);
        assert!(item.media_item().is_some());
    }

    #[test]
    fn text_item_has_no_media() {
        let item = InboundItem {
            sequence: 2,
            conversation: ConversationId(5),
            group: None,
            kind: MediaKind::Text,
            media: None,
            caption: Some("900€ -10%".into()),
        };
        assert!(!item.is_media());
        assert!(item.media_item().is_none());
    }

    #[test]
    fn media_kind_round_trips_through_json() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let parsed: MediaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MediaKind::Video);
    }
}
