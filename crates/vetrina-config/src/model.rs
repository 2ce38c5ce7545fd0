// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vetrina listing relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Vetrina configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VetrinaConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram transport settings (source chats, target chat, delivery).
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Correlation windows, ordering, and pricing mode selection.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Price-tag OCR settings.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Selling modes. Entries override the built-in modes with the same name.
    #[serde(default)]
    pub modes: Vec<ModeConfig>,
}

impl VetrinaConfig {
    /// Built-in modes merged with the configured ones (configured entries win).
    pub fn effective_modes(&self) -> Vec<ModeConfig> {
        let mut modes = builtin_modes();
        for configured in &self.modes {
            match modes.iter_mut().find(|m| m.name == configured.name) {
                Some(existing) => *existing = configured.clone(),
                None => modes.push(configured.clone()),
            }
        }
        modes
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "vetrina".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the Telegram transport.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat ids whose posts are relayed. Empty rejects everything.
    #[serde(default)]
    pub source_chats: Vec<i64>,

    /// Chat id that receives the priced posts.
    #[serde(default)]
    pub target_chat_id: Option<i64>,

    /// URL behind the inline "order" button. `None` omits the button.
    #[serde(default)]
    pub order_url: Option<String>,

    /// Label of the inline "order" button.
    #[serde(default = "default_order_label")]
    pub order_label: String,

    /// Delete the source messages after their post was published.
    #[serde(default)]
    pub delete_originals: bool,

    /// Delivery attempts after the first one for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between delivery attempts.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            source_chats: Vec::new(),
            target_chat_id: None,
            order_url: None,
            order_label: default_order_label(),
            delete_originals: false,
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

fn default_order_label() -> String {
    "🛍 Order".to_string()
}

fn default_max_retries() -> u32 {
    4
}

fn default_retry_base_ms() -> u64 {
    500
}

/// Correlation and ordering configuration for the relay pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Quiet period after the last album member before the album is complete.
    #[serde(default = "default_settle_window_ms")]
    pub settle_window_ms: u64,

    /// How long caption-less media waits for its caption.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    /// Pending posts tracked per conversation. 1 keeps a single slot.
    #[serde(default = "default_max_pending")]
    pub max_pending_per_conversation: usize,

    /// How long a finished post may wait behind an unfinished earlier one.
    #[serde(default = "default_max_hold_secs")]
    pub max_hold_secs: u64,

    /// Grace period for in-flight posts on shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Name of the active selling mode.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Posts whose text contains this marker are ignored.
    #[serde(default)]
    pub skip_marker: Option<String>,

    /// Reply to the source conversation when a media post has no price.
    #[serde(default = "default_hint_on_miss")]
    pub hint_on_miss: bool,

    /// Words removed from captions before extraction.
    #[serde(default = "default_noise_words")]
    pub noise_words: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            settle_window_ms: default_settle_window_ms(),
            pending_ttl_secs: default_pending_ttl_secs(),
            max_pending_per_conversation: default_max_pending(),
            max_hold_secs: default_max_hold_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
            mode: default_mode(),
            skip_marker: None,
            hint_on_miss: default_hint_on_miss(),
            noise_words: default_noise_words(),
        }
    }
}

fn default_settle_window_ms() -> u64 {
    1200
}

fn default_pending_ttl_secs() -> u64 {
    30
}

fn default_max_pending() -> usize {
    1
}

fn default_max_hold_secs() -> u64 {
    60
}

fn default_drain_timeout_secs() -> u64 {
    10
}

fn default_mode() -> String {
    "standard".to_string()
}

fn default_hint_on_miss() -> bool {
    true
}

fn default_noise_words() -> Vec<String> {
    vec!["мужское".to_string(), "женское".to_string()]
}

/// Price-tag OCR configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OcrConfig {
    /// Disable to publish every album photo unfiltered.
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,

    /// Tesseract executable.
    #[serde(default = "default_ocr_command")]
    pub command: String,

    /// Language sets tried in order until one yields text.
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,

    /// Per-invocation timeout.
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_ocr_enabled(),
            command: default_ocr_command(),
            languages: default_ocr_languages(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_ocr_enabled() -> bool {
    true
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_languages() -> Vec<String> {
    vec!["eng+ita".to_string(), "eng".to_string(), "eng+rus".to_string()]
}

fn default_ocr_timeout_secs() -> u64 {
    20
}

/// Caption layout used by a selling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Bold lines: final price, retail price, season, sizes.
    BoldBlock,
    /// Final price and retail price in bold, then sizes and season.
    Compact,
}

/// A named selling mode.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    /// Mode name referenced by `relay.mode`.
    pub name: String,

    /// Markup above the 400 band, e.g. `+90€` or `+10%+30€`.
    pub high_tier: String,

    /// Caption layout.
    #[serde(default = "default_template")]
    pub template: TemplateKind,
}

fn default_template() -> TemplateKind {
    TemplateKind::BoldBlock
}

/// Modes available without any `[[modes]]` entries.
pub fn builtin_modes() -> Vec<ModeConfig> {
    vec![
        ModeConfig {
            name: "standard".to_string(),
            high_tier: "+10%+30€".to_string(),
            template: TemplateKind::BoldBlock,
        },
        ModeConfig {
            name: "flat".to_string(),
            high_tier: "+90€".to_string(),
            template: TemplateKind::Compact,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_modes_include_builtins() {
        let config = VetrinaConfig::default();
        let names: Vec<_> = config
            .effective_modes()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["standard", "flat"]);
    }

    #[test]
    fn configured_mode_overrides_builtin() {
        let mut config = VetrinaConfig::default();
        config.modes.push(ModeConfig {
            name: "flat".into(),
            high_tier: "+100€".into(),
            template: TemplateKind::BoldBlock,
        });
        config.modes.push(ModeConfig {
            name: "outlet".into(),
            high_tier: "+5%+20€".into(),
            template: TemplateKind::Compact,
        });
        let modes = config.effective_modes();
        assert_eq!(modes.len(), 3);
        let flat = modes.iter().find(|m| m.name == "flat").unwrap();
        assert_eq!(flat.high_tier, "+100€");
        assert_eq!(flat.template, TemplateKind::BoldBlock);
    }

    #[test]
    fn template_kind_uses_snake_case() {
        let mode: ModeConfig = toml::from_str(
            r#"
name = "x"
high_tier = "+90€"
template = "compact"
"#,
        )
        .unwrap();
        assert_eq!(mode.template, TemplateKind::Compact);
    }
}
