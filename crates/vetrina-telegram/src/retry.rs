// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with exponential backoff for Bot API calls.
//!
//! Flood control (`RetryAfter`) and network failures are retried; every other
//! API error is permanent and returned straight away.

use std::future::IntoFuture;
use std::time::Duration;

use teloxide::RequestError;
use tracing::warn;
use vetrina_config::model::TelegramConfig;
use vetrina_core::{PublishErrorKind, VetrinaError};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How a failed request should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Retry after the server-mandated delay.
    RetryAfter(Duration),
    /// Retry after the backoff delay.
    Retry,
    Permanent,
}

pub fn classify(error: &RequestError) -> Verdict {
    match error {
        RequestError::RetryAfter(after) => Verdict::RetryAfter(after.duration()),
        RequestError::Network(_) | RequestError::Io(_) => Verdict::Retry,
        _ => Verdict::Permanent,
    }
}

/// Converts a request error into a publish error of the matching kind.
pub fn to_publish_error(op: &str, error: RequestError) -> VetrinaError {
    let kind = match classify(&error) {
        Verdict::Permanent => PublishErrorKind::Permanent,
        _ => PublishErrorKind::Transient,
    };
    VetrinaError::Publish {
        kind,
        message: format!("{op} failed: {error}"),
        source: Some(Box::new(error)),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: Duration::from_millis(config.retry_base_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Runs `call` until it succeeds, fails permanently or retries run out.
    pub async fn run<T, F, R>(&self, op: &str, mut call: F) -> Result<T, VetrinaError>
    where
        F: FnMut() -> R + Send,
        R: IntoFuture<Output = Result<T, RequestError>> + Send,
        R::IntoFuture: Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            let delay = match classify(&error) {
                Verdict::Permanent => return Err(to_publish_error(op, error)),
                _ if attempt >= self.max_retries => return Err(to_publish_error(op, error)),
                Verdict::RetryAfter(after) => after,
                Verdict::Retry => self.backoff(attempt),
            };
            warn!(
                op,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "telegram request failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
