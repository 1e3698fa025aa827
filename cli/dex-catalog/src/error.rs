//! Error handling for catalog requests.
//!
//! Every failure of a request is classified into exactly one [DexError]
//! variant before it leaves this crate, so consumers never have to inspect
//! transport errors themselves.

use std::fmt::Display;

use reqwest::StatusCode;
use thiserror::Error;

const NETWORK_ERROR_MESSAGE: &str = "Network error - check your internet connection";
const VALIDATION_ERROR_MESSAGE: &str = "Failed to validate API response";
const UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// The category of a [DexError] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Api,
    Validation,
    Aborted,
    Unknown,
}

/// A classified failure of a catalog request.
///
/// Errors are [Clone] so that a single failed catalog fetch can be handed to
/// every caller that was waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DexError {
    /// Connectivity, DNS or timeout failure.
    #[error("{message}")]
    Network { message: String },
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The response body did not have the expected shape.
    #[error("{message}")]
    Validation { message: String, cause: String },
    /// The request was cancelled by its caller or superseded by newer work.
    #[error("Request was aborted")]
    Aborted,
    #[error("{message}")]
    Unknown { message: String },
}

impl DexError {
    pub fn network() -> Self {
        DexError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn api(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or_default();
        DexError::Api {
            status: status.as_u16(),
            message: format!("API error: {} {reason}", status.as_u16())
                .trim_end()
                .to_string(),
        }
    }

    pub fn validation(cause: impl Display) -> Self {
        DexError::Validation {
            message: VALIDATION_ERROR_MESSAGE.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        let message = message.into();
        DexError::Unknown {
            message: if message.is_empty() {
                UNKNOWN_ERROR_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    /// Classify a transport level error.
    ///
    /// Status errors become [DexError::Api], anything that prevented a
    /// response from arriving becomes [DexError::Network].
    pub fn from_transport(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return DexError::api(status);
        }
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            return DexError::network();
        }
        DexError::unknown(err.to_string())
    }

    /// Whether re-issuing the request that produced this error may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DexError::Network { .. } => true,
            DexError::Api { status, .. } => *status >= 500,
            DexError::Validation { .. } | DexError::Aborted | DexError::Unknown { .. } => false,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, DexError::Aborted)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DexError::Network { .. } => ErrorKind::Network,
            DexError::Api { .. } => ErrorKind::Api,
            DexError::Validation { .. } => ErrorKind::Validation,
            DexError::Aborted => ErrorKind::Aborted,
            DexError::Unknown { .. } => ErrorKind::Unknown,
        }
    }
}

/// Errors constructing a [crate::DexClient].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid base url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("could not build HTTP client")]
    Http(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn api_error_retryable_only_for_server_errors() {
        assert!(!DexError::api(StatusCode::NOT_FOUND).is_retryable());
        assert!(!DexError::api(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(DexError::api(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(DexError::api(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
    }

    #[test]
    fn only_network_and_server_errors_are_retryable() {
        assert!(DexError::network().is_retryable());
        assert!(!DexError::validation("missing field `id`").is_retryable());
        assert!(!DexError::Aborted.is_retryable());
        assert!(!DexError::unknown("boom").is_retryable());
    }

    #[test]
    fn api_error_message_includes_status_and_reason() {
        let err = DexError::api(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "API error: 404 Not Found");
        assert_eq!(err, DexError::Api {
            status: 404,
            message: "API error: 404 Not Found".to_string()
        });
    }

    #[test]
    fn default_messages() {
        assert_eq!(
            DexError::network().to_string(),
            "Network error - check your internet connection"
        );
        assert_eq!(DexError::Aborted.to_string(), "Request was aborted");
        assert_eq!(DexError::unknown("").to_string(), "An unexpected error occurred");
        assert_eq!(
            DexError::validation("invalid type").to_string(),
            "Failed to validate API response"
        );
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(DexError::network().kind(), ErrorKind::Network);
        assert_eq!(DexError::Aborted.kind(), ErrorKind::Aborted);
        assert!(DexError::Aborted.is_aborted());
        assert!(!DexError::network().is_aborted());
    }
}
