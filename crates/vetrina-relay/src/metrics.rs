// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a
//! no-op.

use metrics::describe_counter;

/// Register all relay metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("vetrina_items_total", "Inbound items received by kind");
    describe_counter!("vetrina_posts_published_total", "Posts delivered to the target");
    describe_counter!(
        "vetrina_images_hidden_total",
        "Album images dropped for exposing a price tag"
    );
    describe_counter!(
        "vetrina_pending_expired_total",
        "Pending media discarded without a caption"
    );
    describe_counter!(
        "vetrina_publish_failures_total",
        "Posts that could not be delivered"
    );
}

pub fn record_item(kind: &str) {
    metrics::counter!("vetrina_items_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_published(shape: &'static str) {
    metrics::counter!("vetrina_posts_published_total", "shape" => shape).increment(1);
}

pub fn record_hidden(count: usize) {
    metrics::counter!("vetrina_images_hidden_total").increment(count as u64);
}

pub fn record_pending_expired() {
    metrics::counter!("vetrina_pending_expired_total").increment(1);
}

pub fn record_publish_failure(kind: &str) {
    metrics::counter!("vetrina_publish_failures_total", "kind" => kind.to_string()).increment(1);
}
