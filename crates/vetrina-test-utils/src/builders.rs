// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound item builders.
//!
//! Media refs are `photo-<seq>` / `video-<seq>` so tests can refer to them
//! by sequence number.

use vetrina_core::types::{ConversationId, GroupId, InboundItem, MediaKind, MediaRef};

/// Conversation used when a test does not care.
pub const SOURCE_CHAT: ConversationId = ConversationId(-100_500);

/// A photo without caption or group.
pub fn photo(sequence: i64) -> InboundItem {
    media(sequence, MediaKind::Photo)
}

/// A video without caption or group.
pub fn video(sequence: i64) -> InboundItem {
    media(sequence, MediaKind::Video)
}

/// A free-text message.
pub fn text(sequence: i64, caption: &str) -> InboundItem {
    InboundItem {
        sequence,
        conversation: SOURCE_CHAT,
        group: None,
        kind: MediaKind::Text,
        media: None,
        caption: Some(caption.to_string()),
    }
}

fn media(sequence: i64, kind: MediaKind) -> InboundItem {
    InboundItem {
        sequence,
        conversation: SOURCE_CHAT,
        group: None,
        kind,
        media: Some(MediaRef(format!("{kind}-{sequence}"))),
        caption: None,
    }
}

/// Builder-style adjustments for inbound items.
pub trait ItemExt {
    fn in_group(self, group: &str) -> Self;
    fn with_caption(self, caption: &str) -> Self;
    fn in_conversation(self, conversation: i64) -> Self;
}

impl ItemExt for InboundItem {
    fn in_group(mut self, group: &str) -> Self {
        self.group = Some(GroupId(group.to_string()));
        self
    }

    fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.to_string());
        self
    }

    fn in_conversation(mut self, conversation: i64) -> Self {
        self.conversation = ConversationId(conversation);
        self
    }
}
