// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vetrina integration tests.
//!
//! Provides mock adapters and item builders for fast, deterministic,
//! CI-runnable tests without Telegram or tesseract.
//!
//! # Components
//!
//! - [`MockPublisher`] - Captures deliveries, hints and retractions
//! - [`MockFetcher`] / [`MockRecognizer`] - Canned image bytes and OCR output
//! - [`builders`] - Inbound item constructors

pub mod builders;
pub mod mock_ocr;
pub mod mock_publisher;

pub use builders::{ItemExt, SOURCE_CHAT, photo, text, video};
pub use mock_ocr::{MockFetcher, MockRecognizer};
pub use mock_publisher::{MockPublisher, Published};
