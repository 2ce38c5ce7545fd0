// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive time windows and references between sections.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::VetrinaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing fast.
pub fn validate_config(config: &VetrinaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let relay = &config.relay;
    if relay.settle_window_ms == 0 {
        invalid("relay.settle_window_ms must be greater than 0".to_string());
    }
    if relay.pending_ttl_secs == 0 {
        invalid("relay.pending_ttl_secs must be greater than 0".to_string());
    }
    if relay.max_pending_per_conversation == 0 {
        invalid("relay.max_pending_per_conversation must be at least 1".to_string());
    }
    if relay.max_hold_secs == 0 {
        invalid("relay.max_hold_secs must be greater than 0".to_string());
    }
    if let Some(marker) = &relay.skip_marker
        && marker.trim().is_empty()
    {
        invalid("relay.skip_marker must not be blank when set".to_string());
    }

    let mut seen = HashSet::new();
    for (i, mode) in config.modes.iter().enumerate() {
        if mode.name.trim().is_empty() {
            invalid(format!("modes[{i}].name must not be empty"));
        } else if !seen.insert(mode.name.as_str()) {
            invalid(format!("duplicate mode name `{}` in [[modes]] array", mode.name));
        }
        if mode.high_tier.trim().is_empty() {
            invalid(format!("modes[{i}].high_tier must not be empty"));
        }
    }

    let modes = config.effective_modes();
    if !modes.iter().any(|m| m.name == relay.mode) {
        let known: Vec<_> = modes.iter().map(|m| m.name.as_str()).collect();
        invalid(format!(
            "relay.mode `{}` is not a known mode (known: {})",
            relay.mode,
            known.join(", ")
        ));
    }

    if let Some(url) = &config.telegram.order_url
        && !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with("tg://"))
    {
        invalid(format!("telegram.order_url `{url}` must be an http(s) or tg:// URL"));
    }

    if config.ocr.enabled {
        if config.ocr.command.trim().is_empty() {
            invalid("ocr.command must not be empty when ocr.enabled = true".to_string());
        }
        if config.ocr.languages.is_empty() {
            invalid("ocr.languages must list at least one language set".to_string());
        }
        if config.ocr.timeout_secs == 0 {
            invalid("ocr.timeout_secs must be greater than 0".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
