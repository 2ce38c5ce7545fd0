// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media download for the price-tag filter.
//!
//! Resolves a file id through `getFile` and downloads the bytes from the
//! Telegram file servers.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;
use vetrina_core::VetrinaError;
use vetrina_core::traits::{MediaFetcher, PluginAdapter};
use vetrina_core::types::{AdapterType, MediaRef};

/// Downloads a file from Telegram servers by its file id.
pub async fn download_file(bot: &Bot, file_id: &FileId) -> Result<Vec<u8>, VetrinaError> {
    let file = bot
        .get_file(file_id.clone())
        .await
        .map_err(|e| VetrinaError::Fetch {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| VetrinaError::Fetch {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(
        file_id = %file_id,
        size = buf.len(),
        "downloaded file from Telegram"
    );
    Ok(buf)
}

/// [`MediaFetcher`] over the Bot API. Media refs are Telegram file ids.
#[derive(Clone)]
pub struct TelegramFetcher {
    bot: Bot,
}

impl TelegramFetcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl PluginAdapter for TelegramFetcher {
    fn name(&self) -> &str {
        "telegram-fetcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Fetcher
    }
}

#[async_trait]
impl MediaFetcher for TelegramFetcher {
    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, VetrinaError> {
        download_file(&self.bot, &FileId(media.0.clone())).await
    }
}
