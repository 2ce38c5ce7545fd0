// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text recognition (OCR) trait.

use async_trait::async_trait;

use crate::error::VetrinaError;
use crate::traits::adapter::PluginAdapter;

/// Black-box OCR engine.
///
/// Best effort: callers treat any error, and an empty string, as
/// "nothing recognized".
#[async_trait]
pub trait TextRecognizer: PluginAdapter {
    async fn recognize(&self, image: &[u8]) -> Result<String, VetrinaError>;
}
