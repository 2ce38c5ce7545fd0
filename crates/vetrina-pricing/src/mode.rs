// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selling modes: a high-band markup rule paired with a caption layout.

use std::collections::HashMap;

use vetrina_config::VetrinaConfig;
use vetrina_config::model::ModeConfig;
use vetrina_core::VetrinaError;

use crate::caption::CaptionTemplate;
use crate::extract::ExtractedFields;
use crate::formula::{HighTierRule, compute_final};

/// A named, immutable pricing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SellingMode {
    pub name: String,
    pub high_tier: HighTierRule,
    pub template: CaptionTemplate,
}

impl SellingMode {
    pub fn from_config(config: &ModeConfig) -> Result<Self, VetrinaError> {
        let high_tier = config.high_tier.parse::<HighTierRule>().map_err(|e| {
            VetrinaError::Config(format!(
                "mode `{}`: invalid high_tier `{}`: {e}",
                config.name, config.high_tier
            ))
        })?;
        Ok(Self {
            name: config.name.clone(),
            high_tier,
            template: config.template.into(),
        })
    }

    /// Final price for a priced extraction, `None` when the caption had no price.
    pub fn final_price(&self, fields: &ExtractedFields) -> Option<u64> {
        let price = fields.price?;
        Some(compute_final(price, fields.discount_percent, &self.high_tier))
    }

    /// Renders the outbound caption, `None` when the caption had no price.
    pub fn caption(&self, fields: &ExtractedFields) -> Option<String> {
        let final_price = self.final_price(fields)?;
        Some(self.template.render(final_price, fields))
    }
}

/// All selling modes known to the process, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ModeRegistry {
    modes: HashMap<String, SellingMode>,
}

impl ModeRegistry {
    /// Builds the registry from built-in and configured modes.
    ///
    /// Fails on the first unparseable `high_tier` formula.
    pub fn from_config(config: &VetrinaConfig) -> Result<Self, VetrinaError> {
        let modes = config
            .effective_modes()
            .iter()
            .map(|m| SellingMode::from_config(m).map(|mode| (mode.name.clone(), mode)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { modes })
    }

    pub fn get(&self, name: &str) -> Option<&SellingMode> {
        self.modes.get(name)
    }

    /// Looks up the mode selected by `relay.mode`.
    pub fn active(&self, config: &VetrinaConfig) -> Result<SellingMode, VetrinaError> {
        self.get(&config.relay.mode).cloned().ok_or_else(|| {
            VetrinaError::Config(format!("relay.mode `{}` is not a known mode", config.relay.mode))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
