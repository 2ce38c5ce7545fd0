// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Vetrina relay pipeline.
//!
//! Groups burst-arriving media into albums, pairs caption-less media with a
//! later caption, prices and filters each post, and publishes posts in the
//! order they were received.
//!
//! # Architecture
//!
//! - [`aggregator`] - album buckets behind a debounced settle window
//! - [`pending`] - per-conversation media waiting for a caption, with TTL
//! - [`tagfilter`] - OCR-backed removal of price-tag photos
//! - [`barrier`] - in-order release of finished posts
//! - [`pipeline`] - the actor owning all of the above
//! - [`publish`] - the delivery worker

pub mod aggregator;
pub mod barrier;
pub mod metrics;
pub mod pending;
pub mod pipeline;
pub mod processor;
pub mod publish;
pub mod shutdown;
pub mod tagfilter;
pub mod timer;

pub use aggregator::{Album, AlbumAggregator};
pub use barrier::{OrderingBarrier, PublishKey};
pub use pending::PendingRegistry;
pub use pipeline::{RelayDeps, RelayHandle, RelaySettings, spawn_relay};
pub use processor::PostProcessor;
pub use tagfilter::{FilterOutcome, PriceTagFilter, reveals_price_tag};
pub use timer::TimerFired;
