// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use thiserror::Error;

/// Errors surfaced by the portal client, the navigation engine and the
/// stream resolver. None of them are retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network failure or a non-2xx HTTP status
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Payload is missing the expected `js` / `js.data` shape
    #[error("malformed portal response: {0}")]
    MalformedResponse(String),

    /// Episode playback command matches neither known grammar
    #[error("invalid episode command format: {0}")]
    InvalidCommandFormat(String),

    /// The create_link response carried no http(s) URL
    #[error("no valid stream URL found in: {0}")]
    NoStreamUrlFound(String),

    /// A newer resolution superseded this one
    #[error("stream request cancelled")]
    StreamRequestCancelled,

    /// Navigation operation is not valid from the current state
    #[error("invalid navigation: {0}")]
    InvalidTransition(String),
}

impl Error {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::StreamRequestCancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::transport(e.status().map(|s| s.as_u16()), e.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_includes_status() {
        let e = Error::transport(Some(503), "Service Unavailable");
        assert_eq!(e.to_string(), "transport error (HTTP 503): Service Unavailable");

        let e = Error::transport(None, "connection refused");
        assert_eq!(e.to_string(), "transport error: connection refused");
    }

    #[test]
    fn only_cancellation_is_cancellation() {
        assert!(Error::StreamRequestCancelled.is_cancellation());
        assert!(!Error::NoStreamUrlFound("x".into()).is_cancellation());
    }
}
