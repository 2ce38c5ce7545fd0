// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text recognizer backed by the `tesseract` command-line tool.
//!
//! Each image is piped to `tesseract stdin stdout -l <langs>`. Language sets
//! are tried in order and the first non-empty output wins.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};
use vetrina_config::model::OcrConfig;
use vetrina_core::VetrinaError;
use vetrina_core::traits::{PluginAdapter, TextRecognizer};
use vetrina_core::types::{AdapterType, HealthStatus};

/// Runs the tesseract CLI once per language set.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: String,
    languages: Vec<String>,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<String>, languages: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            languages,
            timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.languages.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Arguments for one invocation.
    fn args(languages: &str) -> [&str; 4] {
        ["stdin", "stdout", "-l", languages]
    }

    async fn run_once(&self, image: &[u8], languages: &str) -> Result<String, VetrinaError> {
        let mut child = Command::new(&self.command)
            .args(Self::args(languages))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VetrinaError::Recognition {
                message: format!("failed to start {}: {e}", self.command),
                source: Some(Box::new(e)),
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // The tool may exit before reading everything; its output still counts.
                if let Err(e) = stdin.write_all(image).await {
                    debug!(error = %e, "recognizer closed stdin early");
                }
            }
        };
        // Feeding and waiting share one deadline; a stalled tool is killed on drop.
        let run = async {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| VetrinaError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| VetrinaError::Recognition {
                message: format!("{} did not finish: {e}", self.command),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VetrinaError::Recognition {
                message: format!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    stderr.trim()
                ),
                source: None,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl PluginAdapter for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Recognizer
    }

    async fn health_check(&self) -> Result<HealthStatus, VetrinaError> {
        let version_check = Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match version_check {
            Ok(status) if status.success() => Ok(HealthStatus::Healthy),
            Ok(status) => Ok(HealthStatus::Degraded(format!(
                "{} --version exited with {status}",
                self.command
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not runnable: {e}",
                self.command
            ))),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, VetrinaError> {
        let mut last_error = None;
        let mut any_ran = false;
        for languages in &self.languages {
            match self.run_once(image, languages).await {
                Ok(text) if !text.is_empty() => {
                    debug!(languages = %languages, chars = text.len(), "text recognized");
                    return Ok(text);
                }
                Ok(_) => {
                    any_ran = true;
                    debug!(languages = %languages, "no text recognized");
                }
                Err(e) => {
                    warn!(languages = %languages, error = %e, "recognizer run failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            // Every language set failed outright.
            Some(e) if !any_ran => Err(e),
            _ => Ok(String::new()),
        }
    }
}
