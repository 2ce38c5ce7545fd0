// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source filtering and conversion of Telegram messages into inbound items.
//!
//! Channel posts and chat messages are handled alike. Only photos, videos and
//! text reach the relay; everything else is ignored.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vetrina_core::types::{ConversationId, GroupId, InboundItem, MediaKind, MediaRef};

/// Chat ids whose posts are relayed.
#[derive(Debug, Clone, Default)]
pub struct SourceChats(pub Arc<Vec<i64>>);

impl SourceChats {
    pub fn new(chats: Vec<i64>) -> Self {
        Self(Arc::new(chats))
    }

    /// An empty list rejects every chat.
    pub fn allows(&self, msg: &Message) -> bool {
        self.0.contains(&msg.chat.id.0)
    }
}

/// Converts a message into an [`InboundItem`].
///
/// Photos use the largest size (last in the array). Returns `None` for
/// unsupported message types (stickers, documents, polls, ...).
pub fn to_inbound_item(msg: &Message) -> Option<InboundItem> {
    let (kind, media, caption) = if let Some(photos) = msg.photo() {
        let largest = photos.last()?;
        (
            MediaKind::Photo,
            Some(MediaRef(largest.file.id.to_string())),
            msg.caption(),
        )
    } else if let Some(video) = msg.video() {
        (
            MediaKind::Video,
            Some(MediaRef(video.file.id.to_string())),
            msg.caption(),
        )
    } else if let Some(text) = msg.text() {
        (MediaKind::Text, None, Some(text))
    } else {
        return None;
    };

    Some(InboundItem {
        sequence: i64::from(msg.id.0),
        conversation: ConversationId(msg.chat.id.0),
        group: msg.media_group_id().map(|g| GroupId(g.to_string())),
        kind,
        media,
        caption: caption.map(str::to_string),
    })
}

/// Dispatcher endpoint for both channel posts and messages.
pub async fn forward(
    msg: Message,
    sources: SourceChats,
    tx: mpsc::Sender<InboundItem>,
) -> ResponseResult<()> {
    if !sources.allows(&msg) {
        debug!(chat_id = msg.chat.id.0, "ignoring message from unlisted chat");
        return Ok(());
    }

    match to_inbound_item(&msg) {
        Some(item) => {
            if tx.send(item).await.is_err() {
                warn!("relay intake closed, dropping message");
            }
        }
        None => debug!(msg_id = msg.id.0, "ignoring unsupported message type"),
    }
    Ok(())
}
