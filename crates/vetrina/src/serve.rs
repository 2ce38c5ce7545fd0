// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vetrina serve` command implementation.
//!
//! Wires the Telegram transport, the OCR recognizer and the pricing mode into
//! the relay pipeline, then runs until SIGINT or SIGTERM.

use std::sync::Arc;

use tracing::{error, info, warn};
use vetrina_config::VetrinaConfig;
use vetrina_core::VetrinaError;
use vetrina_core::traits::PluginAdapter;
use vetrina_core::types::HealthStatus;
use vetrina_ocr::TesseractRecognizer;
use vetrina_relay::shutdown;
use vetrina_relay::{PriceTagFilter, RelayDeps, RelaySettings, spawn_relay};
use vetrina_telegram::{TelegramFetcher, TelegramPublisher, TelegramSource};

use crate::price;

async fn report_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter healthy"),
        Ok(HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), %reason, "adapter not healthy")
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "health check failed"),
    }
}

pub async fn run_serve(config: VetrinaConfig) -> Result<(), VetrinaError> {
    info!(name = %config.service.name, "starting vetrina serve");
    vetrina_relay::metrics::register_metrics();

    let pricer = price::pricer(&config)?;
    info!(mode = %pricer.mode().name, high_tier = %pricer.mode().high_tier, "selling mode active");

    let bot = vetrina_telegram::connect(&config.telegram)?;
    let publisher = Arc::new(TelegramPublisher::new(bot.clone(), &config.telegram)?);
    report_health(publisher.as_ref()).await;

    let tag_filter = if config.ocr.enabled {
        let recognizer = TesseractRecognizer::from_config(&config.ocr);
        report_health(&recognizer).await;
        Some(PriceTagFilter::new(
            Arc::new(TelegramFetcher::new(bot.clone())),
            Arc::new(recognizer),
        ))
    } else {
        info!("price-tag filter disabled by configuration");
        None
    };

    let cancel = shutdown::install_signal_handler();
    let relay = spawn_relay(
        RelaySettings::from_config(&config),
        RelayDeps {
            publisher,
            pricer,
            tag_filter,
        },
        cancel.clone(),
    );
    let poller = TelegramSource::new(bot, &config.telegram).spawn(relay.sender(), cancel.clone());

    cancel.cancelled().await;
    if let Err(e) = poller.await {
        error!(error = %e, "Telegram polling task failed");
    }
    relay.finish().await;

    info!("vetrina serve shutdown complete");
    Ok(())
}
