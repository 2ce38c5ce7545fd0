// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publisher trait for delivering finished posts to the output destination.

use async_trait::async_trait;

use crate::error::VetrinaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationId, MediaItem, MessageId};

/// Delivers single media, media groups, and text to the target conversation.
///
/// Implementations own retry with backoff for transient failures. An error
/// returned from these methods is final for that post.
#[async_trait]
pub trait Publisher: PluginAdapter {
    /// Sends one photo or video with a caption.
    async fn send_single(&self, media: &MediaItem, caption: &str)
    -> Result<MessageId, VetrinaError>;

    /// Sends a media group; the caption is attached to the first item.
    async fn send_group(
        &self,
        media: &[MediaItem],
        caption: &str,
    ) -> Result<Vec<MessageId>, VetrinaError>;

    /// Sends a text-only post.
    async fn send_text(&self, caption: &str) -> Result<MessageId, VetrinaError>;

    /// Sends a short notice back to the conversation a post came from.
    async fn send_hint(&self, conversation: ConversationId, text: &str)
    -> Result<(), VetrinaError>;

    /// Removes the original source messages after their post was published.
    async fn retract(
        &self,
        conversation: ConversationId,
        sequences: &[i64],
    ) -> Result<(), VetrinaError>;
}
