//! Error types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure category attached to a file that did not convert.
///
/// This is the programmatic side of every per-file error: callers match on
/// the category, the message is only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A local precondition failed before any network call.
    ValidationError,
    /// The endpoint answered 413.
    PayloadTooLarge,
    /// The endpoint answered 400.
    InvalidFormat,
    /// The endpoint answered with any other non-2xx status.
    ServerError,
    /// Network failure, timeout, or an unusable response body.
    TransportError,
    /// The batch was cancelled before this file was started.
    Cancelled,
}

impl ErrorCategory {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::PayloadTooLarge => "payload_too_large",
            Self::InvalidFormat => "invalid_format",
            Self::ServerError => "server_error",
            Self::TransportError => "transport_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a [`ConversionClient`](super::ConversionClient).
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// HTTP 413 from the endpoint.
    #[error("File is too large for processing{}", detail_suffix(.detail))]
    PayloadTooLarge { detail: Option<String> },

    /// HTTP 400 from the endpoint.
    #[error("Invalid file format{}", detail_suffix(.detail))]
    InvalidFormat { detail: Option<String> },

    /// Any other non-2xx status.
    #[error("Server error ({status}){}", detail_suffix(.detail))]
    ServerError { status: u16, detail: Option<String> },

    /// Network failure, timeout, or malformed response.
    #[error("Transport error: {0}")]
    Transport(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(": {}", d),
        _ => String::new(),
    }
}

impl ConversionError {
    /// Maps a non-success HTTP status to the matching error.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            413 => Self::PayloadTooLarge { detail },
            400 => Self::InvalidFormat { detail },
            _ => Self::ServerError { status, detail },
        }
    }

    /// Creates a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// The failure category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PayloadTooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::InvalidFormat { .. } => ErrorCategory::InvalidFormat,
            Self::ServerError { .. } => ErrorCategory::ServerError,
            Self::Transport(_) => ErrorCategory::TransportError,
        }
    }

    /// The HTTP status behind this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::PayloadTooLarge { .. } => Some(413),
            Self::InvalidFormat { .. } => Some(400),
            Self::ServerError { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}
