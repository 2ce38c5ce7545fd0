// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media fetcher and text recognizer.
//!
//! `MockFetcher` returns the media ref itself as the image bytes, so a
//! `MockRecognizer` can key its canned OCR output by media ref.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vetrina_core::VetrinaError;
use vetrina_core::traits::adapter::PluginAdapter;
use vetrina_core::traits::fetcher::MediaFetcher;
use vetrina_core::traits::recognizer::TextRecognizer;
use vetrina_core::types::{AdapterType, MediaRef};

/// Fetcher whose "image bytes" are the UTF-8 bytes of the media ref.
#[derive(Default)]
pub struct MockFetcher {
    failing: Arc<Mutex<HashSet<String>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every fetch of `media` fail.
    pub async fn fail_on(&self, media: &str) {
        self.failing.lock().await.insert(media.to_string());
    }

    /// Media refs fetched so far, in call order.
    pub async fn fetched(&self) -> Vec<String> {
        self.fetched.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockFetcher {
    fn name(&self) -> &str {
        "mock-fetcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Fetcher
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, VetrinaError> {
        self.fetched.lock().await.push(media.0.clone());
        if self.failing.lock().await.contains(&media.0) {
            return Err(VetrinaError::Fetch {
                message: format!("injected fetch failure for {}", media.0),
                source: None,
            });
        }
        Ok(media.0.as_bytes().to_vec())
    }
}

#[derive(Clone)]
enum Canned {
    Text { text: String, delay: Duration },
    Failure,
}

/// Recognizer with pre-configured output per image.
///
/// Images without a canned answer recognize as empty text.
#[derive(Default)]
pub struct MockRecognizer {
    canned: Arc<Mutex<HashMap<Vec<u8>, Canned>>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize `text` for the image fetched from `media`.
    pub async fn with_text(&self, media: &str, text: &str) {
        self.with_delayed_text(media, text, Duration::ZERO).await;
    }

    /// Like [`with_text`](Self::with_text), but recognition takes `delay`.
    pub async fn with_delayed_text(&self, media: &str, text: &str, delay: Duration) {
        self.canned.lock().await.insert(
            media.as_bytes().to_vec(),
            Canned::Text {
                text: text.to_string(),
                delay,
            },
        );
    }

    /// Make recognition of the image fetched from `media` fail.
    pub async fn with_failure(&self, media: &str) {
        self.canned
            .lock()
            .await
            .insert(media.as_bytes().to_vec(), Canned::Failure);
    }
}

#[async_trait]
impl PluginAdapter for MockRecognizer {
    fn name(&self) -> &str {
        "mock-recognizer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Recognizer
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, VetrinaError> {
        let canned = self.canned.lock().await.get(image).cloned();
        match canned {
            Some(Canned::Text { text, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(text)
            }
            Some(Canned::Failure) => Err(VetrinaError::Recognition {
                message: "injected recognition failure".to_string(),
                source: None,
            }),
            None => Ok(String::new()),
        }
    }
}
