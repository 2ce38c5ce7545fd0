// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vetrina price` and `vetrina check` output.

use std::fmt::Write;

use vetrina_config::VetrinaConfig;
use vetrina_core::VetrinaError;
use vetrina_pricing::{FieldExtractor, ModeRegistry, Pricer};

pub fn pricer(config: &VetrinaConfig) -> Result<Pricer, VetrinaError> {
    let mode = ModeRegistry::from_config(config)?.active(config)?;
    Ok(Pricer::new(
        FieldExtractor::new(&config.relay.noise_words),
        mode,
    ))
}

/// Prices `text` and reports the extracted fields and the rendered caption.
pub fn run_price(config: &VetrinaConfig, text: &str) -> Result<String, VetrinaError> {
    let pricer = pricer(config)?;
    let mut out = String::new();
    let Some(quote) = pricer.quote(text) else {
        return Ok(format!("no price found (mode {})", pricer.mode().name));
    };
    let fields = &quote.fields;
    let dash = || "-".to_string();

    let _ = writeln!(out, "mode:       {}", pricer.mode().name);
    let _ = writeln!(out, "price:      {}", fields.price.map_or_else(dash, |p| p.to_string()));
    let _ = writeln!(out, "discount:   {}%", fields.discount_percent);
    let _ = writeln!(out, "reference:  {}", fields.reference_price);
    let _ = writeln!(out, "size:       {}", fields.size.clone().unwrap_or_else(dash));
    let _ = writeln!(out, "season:     {}", fields.season.clone().unwrap_or_else(dash));
    let _ = writeln!(out, "final:      {}", quote.final_price);
    let _ = writeln!(out);
    out.push_str(&quote.caption);
    Ok(out)
}

/// One line per selling mode, the active one marked with `*`.
pub fn describe_modes(config: &VetrinaConfig) -> Result<String, VetrinaError> {
    let modes = ModeRegistry::from_config(config)?;
    let lines: Vec<String> = modes
        .names()
        .into_iter()
        .filter_map(|name| modes.get(name))
        .map(|mode| {
            let marker = if mode.name == config.relay.mode { '*' } else { ' ' };
            format!("{marker} {:<12} {}", mode.name, mode.high_tier)
        })
        .collect();
    Ok(lines.join("\n"))
}
