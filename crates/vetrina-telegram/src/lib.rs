// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the Vetrina listing relay.
//!
//! Provides the inbound long-polling source, a [`Publisher`] that delivers
//! priced posts to the target chat as HTML, and a [`MediaFetcher`] used by
//! the price-tag filter.
//!
//! [`MediaFetcher`]: vetrina_core::traits::MediaFetcher

pub mod handler;
pub mod media;
pub mod retry;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
    InputMediaPhoto, InputMediaVideo, MessageId as TelegramMessageId, ParseMode,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vetrina_config::model::TelegramConfig;
use vetrina_core::VetrinaError;
use vetrina_core::traits::{PluginAdapter, Publisher};
use vetrina_core::types::{
    AdapterType, ConversationId, HealthStatus, InboundItem, MediaItem, MediaKind, MessageId,
};

pub use handler::SourceChats;
pub use media::TelegramFetcher;
pub use retry::RetryPolicy;

/// Telegram caps media groups at ten items.
pub const MAX_GROUP_SIZE: usize = 10;

/// Builds the bot client. Requires `config.bot_token` to be set.
pub fn connect(config: &TelegramConfig) -> Result<Bot, VetrinaError> {
    let token = config.bot_token.as_deref().ok_or_else(|| {
        VetrinaError::Config("telegram.bot_token is required for the Telegram transport".into())
    })?;

    if token.is_empty() {
        return Err(VetrinaError::Config(
            "telegram.bot_token cannot be empty".into(),
        ));
    }

    Ok(Bot::new(token))
}

/// Inline "order" button attached to single and text posts.
fn order_button(config: &TelegramConfig) -> Result<Option<InlineKeyboardMarkup>, VetrinaError> {
    let Some(raw) = config.order_url.as_deref() else {
        return Ok(None);
    };
    let url = url::Url::parse(raw)
        .map_err(|e| VetrinaError::Config(format!("telegram.order_url is not a valid URL: {e}")))?;
    Ok(Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url(config.order_label.clone(), url),
    ]])))
}

fn file(media: &MediaItem) -> InputFile {
    InputFile::file_id(FileId(media.media.0.clone()))
}

fn message_id(sent: &Message) -> MessageId {
    MessageId(sent.id.0.to_string())
}

/// Media group items; the caption goes on the first item only.
fn group_media(media: &[MediaItem], caption: Option<&str>) -> Vec<InputMedia> {
    media
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let caption = caption.filter(|_| i == 0);
            match item.kind {
                MediaKind::Video => {
                    let mut video = InputMediaVideo::new(file(item));
                    if let Some(c) = caption {
                        video = video.caption(c).parse_mode(ParseMode::Html);
                    }
                    InputMedia::Video(video)
                }
                _ => {
                    let mut photo = InputMediaPhoto::new(file(item));
                    if let Some(c) = caption {
                        photo = photo.caption(c).parse_mode(ParseMode::Html);
                    }
                    InputMedia::Photo(photo)
                }
            }
        })
        .collect()
}

/// Delivers posts to the target chat.
pub struct TelegramPublisher {
    bot: Bot,
    target: ChatId,
    order_button: Option<InlineKeyboardMarkup>,
    retry: RetryPolicy,
}

impl TelegramPublisher {
    /// Requires `telegram.target_chat_id`; validates `telegram.order_url`.
    pub fn new(bot: Bot, config: &TelegramConfig) -> Result<Self, VetrinaError> {
        let target = config.target_chat_id.ok_or_else(|| {
            VetrinaError::Config("telegram.target_chat_id is required for publishing".into())
        })?;
        Ok(Self {
            bot,
            target: ChatId(target),
            order_button: order_button(config)?,
            retry: RetryPolicy::from_config(config),
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramPublisher {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, VetrinaError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn send_single(
        &self,
        media: &MediaItem,
        caption: &str,
    ) -> Result<MessageId, VetrinaError> {
        let sent = match media.kind {
            MediaKind::Video => {
                self.retry
                    .run("sendVideo", || {
                        let mut req = self
                            .bot
                            .send_video(self.target, file(media))
                            .caption(caption)
                            .parse_mode(ParseMode::Html);
                        if let Some(kb) = &self.order_button {
                            req = req.reply_markup(kb.clone());
                        }
                        req
                    })
                    .await?
            }
            _ => {
                self.retry
                    .run("sendPhoto", || {
                        let mut req = self
                            .bot
                            .send_photo(self.target, file(media))
                            .caption(caption)
                            .parse_mode(ParseMode::Html);
                        if let Some(kb) = &self.order_button {
                            req = req.reply_markup(kb.clone());
                        }
                        req
                    })
                    .await?
            }
        };
        Ok(message_id(&sent))
    }

    async fn send_group(
        &self,
        media: &[MediaItem],
        caption: &str,
    ) -> Result<Vec<MessageId>, VetrinaError> {
        let mut ids = Vec::with_capacity(media.len());
        for (i, chunk) in media.chunks(MAX_GROUP_SIZE).enumerate() {
            let items = group_media(chunk, Some(caption).filter(|_| i == 0));
            let sent = self
                .retry
                .run("sendMediaGroup", || {
                    self.bot.send_media_group(self.target, items.clone())
                })
                .await?;
            ids.extend(sent.iter().map(message_id));
        }
        debug!(items = media.len(), messages = ids.len(), "media group sent");
        Ok(ids)
    }

    async fn send_text(&self, caption: &str) -> Result<MessageId, VetrinaError> {
        let sent = self
            .retry
            .run("sendMessage", || {
                let mut req = self
                    .bot
                    .send_message(self.target, caption)
                    .parse_mode(ParseMode::Html);
                if let Some(kb) = &self.order_button {
                    req = req.reply_markup(kb.clone());
                }
                req
            })
            .await?;
        Ok(message_id(&sent))
    }

    async fn send_hint(&self, conversation: ConversationId, text: &str) -> Result<(), VetrinaError> {
        self.retry
            .run("sendMessage", || {
                self.bot.send_message(ChatId(conversation.0), text)
            })
            .await?;
        Ok(())
    }

    async fn retract(
        &self,
        conversation: ConversationId,
        sequences: &[i64],
    ) -> Result<(), VetrinaError> {
        let chat = ChatId(conversation.0);
        let mut failed = 0usize;
        for &sequence in sequences {
            let Ok(id) = i32::try_from(sequence) else {
                warn!(sequence, "message id out of range; not deleted");
                failed += 1;
                continue;
            };
            if let Err(e) = self
                .retry
                .run("deleteMessage", || {
                    self.bot.delete_message(chat, TelegramMessageId(id))
                })
                .await
            {
                warn!(%conversation, sequence, error = %e, "failed to delete original message");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(VetrinaError::permanent(format!(
                "{failed} of {} original messages could not be deleted",
                sequences.len()
            )));
        }
        Ok(())
    }
}

/// Long-polling source that feeds allowed chats into the relay.
pub struct TelegramSource {
    bot: Bot,
    sources: SourceChats,
}

impl TelegramSource {
    pub fn new(bot: Bot, config: &TelegramConfig) -> Self {
        if config.source_chats.is_empty() {
            warn!("telegram.source_chats is empty; no posts will be relayed");
        }
        Self {
            bot,
            sources: SourceChats::new(config.source_chats.clone()),
        }
    }

    /// Starts polling until `cancel` fires. Channel posts and messages are
    /// both forwarded to `tx`.
    pub fn spawn(self, tx: mpsc::Sender<InboundItem>, cancel: CancellationToken) -> JoinHandle<()> {
        info!(chats = self.sources.0.len(), "starting Telegram long polling");

        let handler = dptree::entry()
            .branch(Update::filter_channel_post().endpoint(handler::forward))
            .branch(Update::filter_message().endpoint(handler::forward));

        let mut dispatcher = Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.sources, tx])
            .default_handler(|_| async {})
            .build();
        let shutdown = dispatcher.shutdown_token();

        tokio::spawn(async move {
            let stopper = tokio::spawn(async move {
                cancel.cancelled().await;
                match shutdown.shutdown() {
                    Ok(done) => done.await,
                    Err(_) => debug!("dispatcher was not running at shutdown"),
                }
            });
            dispatcher.dispatch().await;
            stopper.abort();
            info!("Telegram polling stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrina_core::types::MediaRef;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11".into()),
            target_chat_id: Some(-100_777),
            ..TelegramConfig::default()
        }
    }

    fn item(seq: i64, kind: MediaKind) -> MediaItem {
        MediaItem {
            sequence: seq,
            kind,
            media: MediaRef(format!("file-{seq}")),
        }
    }

    #[test]
    fn connect_requires_bot_token() {
        let config = TelegramConfig::default();
        assert!(connect(&config).is_err());
    }

    #[test]
    fn connect_rejects_empty_token() {
        let config = TelegramConfig {
            bot_token: Some(String::new()),
            ..TelegramConfig::default()
        };
        assert!(connect(&config).is_err());
    }

    #[test]
    fn publisher_requires_target_chat() {
        let config = TelegramConfig {
            target_chat_id: None,
            ..config()
        };
        let bot = connect(&config).unwrap();
        assert!(TelegramPublisher::new(bot, &config).is_err());
    }

    #[test]
    fn invalid_order_url_is_a_config_error() {
        let config = TelegramConfig {
            order_url: Some("not a url".into()),
            ..config()
        };
        let bot = connect(&config).unwrap();
        let err = TelegramPublisher::new(bot, &config).err().unwrap();
        assert!(matches!(err, VetrinaError::Config(_)));
    }

    #[test]
    fn order_button_uses_configured_label() {
        let config = TelegramConfig {
            order_url: Some("https://t.me/shop_owner".into()),
            order_label: "Order".into(),
            ..config()
        };
        let markup = order_button(&config).unwrap().unwrap();
        assert_eq!(markup.inline_keyboard[0][0].text, "Order");
        assert!(order_button(&self::config()).unwrap().is_none());
    }

    #[test]
    fn group_caption_goes_on_first_item() {
        let media = vec![item(1, MediaKind::Photo), item(2, MediaKind::Video)];
        let items = group_media(&media, Some("<b>295€</b>"));
        match (&items[0], &items[1]) {
            (InputMedia::Photo(first), InputMedia::Video(second)) => {
                assert_eq!(first.caption.as_deref(), Some("<b>295€</b>"));
                assert_eq!(first.parse_mode, Some(ParseMode::Html));
                assert!(second.caption.is_none());
            }
            other => panic!("unexpected media shapes: {other:?}"),
        }
    }

    #[test]
    fn plugin_adapter_metadata() {
        let config = config();
        let publisher = TelegramPublisher::new(connect(&config).unwrap(), &config).unwrap();
        assert_eq!(publisher.name(), "telegram");
        assert_eq!(publisher.version(), semver::Version::new(0, 1, 0));
        assert_eq!(publisher.adapter_type(), AdapterType::Publisher);
    }
}
