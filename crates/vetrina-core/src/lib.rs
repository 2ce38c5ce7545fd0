// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vetrina listing relay.
//!
//! This crate provides the domain types, error type, and adapter traits used
//! throughout the Vetrina workspace. Transport and OCR adapters implement the
//! traits defined here; the relay pipeline consumes them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{PublishErrorKind, VetrinaError};
pub use types::{
    AdapterType, ConversationId, GroupId, HealthStatus, InboundItem, LogicalPost, MediaItem,
    MediaKind, MediaRef, MessageId, OutboundPost, PublishPayload,
};

pub use traits::{MediaFetcher, PluginAdapter, Publisher, TextRecognizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Source,
            AdapterType::Publisher,
            AdapterType::Fetcher,
            AdapterType::Recognizer,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_publisher<T: Publisher>() {}
        fn _assert_fetcher<T: MediaFetcher>() {}
        fn _assert_recognizer<T: TextRecognizer>() {}
    }

    #[tokio::test]
    async fn default_health_check_is_healthy() {
        struct Dummy;

        #[async_trait::async_trait]
        impl PluginAdapter for Dummy {
            fn name(&self) -> &str {
                "dummy"
            }
            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }
            fn adapter_type(&self) -> AdapterType {
                AdapterType::Recognizer
            }
        }

        assert_eq!(Dummy.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(Dummy.shutdown().await.is_ok());
    }
}
