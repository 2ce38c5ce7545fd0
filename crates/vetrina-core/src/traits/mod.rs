// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators around the relay pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod fetcher;
pub mod publisher;
pub mod recognizer;

pub use adapter::PluginAdapter;
pub use fetcher::MediaFetcher;
pub use publisher::Publisher;
pub use recognizer::TextRecognizer;
