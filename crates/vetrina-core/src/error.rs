// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vetrina listing relay.

use strum::Display;
use thiserror::Error;

/// Whether a failed delivery is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PublishErrorKind {
    /// Rate limiting or network trouble; the publisher retries with backoff.
    Transient,
    /// Permission denied, deleted chat, malformed request. Reported once.
    Permanent,
}

/// The primary error type used across all Vetrina adapter traits and core operations.
#[derive(Debug, Error)]
pub enum VetrinaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound transport errors (polling failure, closed channel).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound delivery errors.
    #[error("{kind} publish error: {message}")]
    Publish {
        kind: PublishErrorKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text recognition (OCR) failed or produced nothing usable.
    #[error("recognition error: {message}")]
    Recognition {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Media bytes could not be retrieved from the transport.
    #[error("fetch error: {message}")]
    Fetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VetrinaError {
    /// Shorthand for a permanent publish error without a source.
    pub fn permanent(message: impl Into<String>) -> Self {
        VetrinaError::Publish {
            kind: PublishErrorKind::Permanent,
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a transient publish error without a source.
    pub fn transient(message: impl Into<String>) -> Self {
        VetrinaError::Publish {
            kind: PublishErrorKind::Transient,
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for publish errors that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VetrinaError::Publish {
                kind: PublishErrorKind::Transient,
                ..
            } | VetrinaError::Timeout { .. }
        )
    }
}
