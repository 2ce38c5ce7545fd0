// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price-tag filter: drops album photos that show the original price tag.
//!
//! The recognizer is a black box and unreliable. Every failure along the way
//! (download, OCR, empty text) classifies the image as safe to publish.

use std::sync::{Arc, LazyLock};

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, warn};
use vetrina_core::traits::{MediaFetcher, TextRecognizer};
use vetrina_core::types::MediaItem;
use vetrina_pricing::{AMOUNT_PATTERN as AMOUNT, parse_amount};

/// `650€`, `650,00 €`, `1.650€`, `€ 650`, `EUR 650`, `EURO 650`.
static PRICED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?P<a>{AMOUNT})\s*€|€\s*(?P<b>{AMOUNT})|\beuro?\s*(?P<c>{AMOUNT})"
    ))
    .unwrap()
});

static PRICE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:retail|price|prezzo|цена)").unwrap());

/// Plausible range for a printed price.
const PRICE_RANGE: std::ops::RangeInclusive<f64> = 30.0..=10_000.0;

/// Whether recognized text looks like a price tag.
///
/// Requires a currency-marked amount in range plus either a percent sign or a
/// price keyword.
pub fn reveals_price_tag(text: &str) -> bool {
    let flat = text.replace('\n', " ");
    let has_amount = PRICED_AMOUNT.captures_iter(&flat).any(|caps| {
        ["a", "b", "c"]
            .iter()
            .filter_map(|name| caps.name(name))
            .filter_map(|m| parse_amount(m.as_str()))
            .any(|value| PRICE_RANGE.contains(&value))
    });
    has_amount && (flat.contains('%') || PRICE_KEYWORD.is_match(&flat))
}

/// Media left after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<MediaItem>,
    pub hidden: usize,
}

/// OCR-backed classifier for album photos.
#[derive(Clone)]
pub struct PriceTagFilter {
    fetcher: Arc<dyn MediaFetcher>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl PriceTagFilter {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            fetcher,
            recognizer,
        }
    }

    /// Classifies image bytes. Errors and empty text are a negative result.
    pub async fn should_hide(&self, image: &[u8]) -> bool {
        match self.recognizer.recognize(image).await {
            Ok(text) if text.trim().is_empty() => false,
            Ok(text) => reveals_price_tag(&text),
            Err(e) => {
                warn!(error = %e, "text recognition failed; keeping image");
                false
            }
        }
    }

    async fn classify(&self, item: &MediaItem) -> bool {
        if !item.is_photo() {
            return false;
        }
        match self.fetcher.fetch(&item.media).await {
            Ok(bytes) => self.should_hide(&bytes).await,
            Err(e) => {
                warn!(sequence = item.sequence, error = %e, "image download failed; keeping image");
                false
            }
        }
    }

    /// Removes price-tag photos from a multi-item post.
    ///
    /// Single items pass untouched. If every item would go, the first one is kept.
    pub async fn filter(&self, media: Vec<MediaItem>) -> FilterOutcome {
        if media.len() <= 1 {
            return FilterOutcome {
                kept: media,
                hidden: 0,
            };
        }

        let verdicts = join_all(media.iter().map(|item| self.classify(item))).await;

        let total = media.len();
        let first = media.first().cloned();
        let mut kept: Vec<MediaItem> = media
            .into_iter()
            .zip(verdicts)
            .filter_map(|(item, hide)| (!hide).then_some(item))
            .collect();

        if kept.is_empty() {
            debug!("every album image shows a price tag; keeping the first");
            kept.extend(first);
        }
        let hidden = total - kept.len();
        if hidden > 0 {
            debug!(hidden, total, "price-tag images removed");
        }
        FilterOutcome { kept, hidden }
    }
}
