// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vetrina.toml` > `~/.config/vetrina/vetrina.toml` > `/etc/vetrina/vetrina.toml`
//! with environment variable overrides via `VETRINA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VetrinaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vetrina/vetrina.toml` (system-wide)
/// 3. `~/.config/vetrina/vetrina.toml` (user XDG config)
/// 4. `./vetrina.toml` (local directory)
/// 5. `VETRINA_*` environment variables
pub fn load_config() -> Result<VetrinaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VetrinaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VetrinaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VetrinaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VetrinaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG lookup (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VetrinaConfig::default()))
        .merge(Toml::file("/etc/vetrina/vetrina.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vetrina/vetrina.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vetrina.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `VETRINA_TELEGRAM_BOT_TOKEN` must map to `telegram.bot_token`,
/// not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("VETRINA_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key to its dotted config path.
fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &["service", "telegram", "relay", "ocr"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(map_env_key("relay_pending_ttl_secs"), "relay.pending_ttl_secs");
        assert_eq!(map_env_key("ocr_enabled"), "ocr.enabled");
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
    }

    #[test]
    fn unknown_env_section_is_left_alone() {
        assert_eq!(map_env_key("modes"), "modes");
        assert_eq!(map_env_key("relayx_mode"), "relayx_mode");
    }
}
