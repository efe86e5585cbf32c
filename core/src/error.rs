//! Error types for the mailform client.
//!
//! # Design
//! `MailformError` is the single error type returned by the client. Callers
//! match on the variant to tell a client-side rejection (`InvalidOrder`)
//! apart from a service-side failure (`Upstream`) without inspecting
//! strings. The service reports failures with a JSON envelope that can
//! arrive alongside any status code, including 200; `ErrorEnvelope` is the
//! decoded form of that body.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::order::ServiceCode;

/// Errors returned by `MailformClient`.
#[derive(Debug, Error)]
pub enum MailformError {
    /// No configuration was supplied to the constructor.
    #[error("config cannot be nil")]
    NilConfig,

    /// The order input was rejected before any request was sent.
    #[error(transparent)]
    InvalidOrder(#[from] InvalidOrder),

    /// The service answered with an error envelope, either through an HTTP
    /// error status or inside a 2xx body.
    #[error(transparent)]
    Upstream(#[from] ErrorEnvelope),

    /// The HTTP exchange did not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response body was not valid JSON or did not match the order model.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The PDF attachment could not be read.
    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MailformError {
    /// The service envelope carried by an `Upstream` error.
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            MailformError::Upstream(envelope) => Some(envelope),
            _ => None,
        }
    }
}

/// Failure to complete an HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Raised by transports that talk to something other than `reqwest`.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Code and message of an `ErrorEnvelope`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// The error body returned by the service:
/// `{"error": {"code": "...", "message": "..."}, "detail": "..."}`.
///
/// Displays `detail` when it is non-empty and `error.message` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            detail: String::new(),
        }
    }

    /// Envelope substituted for every 401 response, whatever its body.
    pub fn unauthorized() -> Self {
        Self::new("401", "unauthorized")
    }

    pub fn code(&self) -> &str {
        &self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    /// True when the envelope reports a failure, i.e. `error.message` is set.
    pub fn is_error(&self) -> bool {
        !self.error.message.is_empty()
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(&self.error.message)
        } else {
            f.write_str(&self.detail)
        }
    }
}

impl std::error::Error for ErrorEnvelope {}

fn null_as_default<'de, D>(deserializer: D) -> Result<ErrorBody, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ErrorBody>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client-side rejection of an `OrderInput`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrder {
    #[error("service code: '{0}' not supported. Must be one of {list}", list = ServiceCode::list())]
    UnsupportedService(String),

    #[error("{0} not provided, but is required")]
    MissingField(&'static str),
}
