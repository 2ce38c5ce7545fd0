// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media download trait.

use async_trait::async_trait;

use crate::error::VetrinaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::MediaRef;

/// Retrieves the raw bytes behind a [`MediaRef`] from the transport.
#[async_trait]
pub trait MediaFetcher: PluginAdapter {
    async fn fetch(&self, media: &MediaRef) -> Result<Vec<u8>, VetrinaError>;
}
