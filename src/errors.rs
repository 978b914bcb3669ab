//! Error types for the beanstream client.
//!
//! This module defines the closed set of error kinds the gateway client can
//! report, the [`classify`] table that maps HTTP status codes onto those kinds,
//! and the [`BeanstreamError`] type every fallible operation returns.

use thiserror::Error;

/// Category of a failed gateway operation.
///
/// `Configuration` and `Validation` are raised locally before any network
/// traffic. The status kinds are produced only after a completed HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing local setup (passcode, gateway URL).
    Configuration,
    /// The caller supplied invalid parameters.
    Validation,
    /// The gateway answered 302.
    Redirection,
    /// The gateway answered 400, 405 or 415.
    InvalidRequest,
    /// The gateway answered 401.
    UnAuthorized,
    /// The gateway answered 402.
    BusinessRule,
    /// The gateway answered 403.
    Forbidden,
    /// Any other non-success status.
    InternalServer,
    /// Generic API failure, e.g. an undecodable success body.
    Api,
}

/// Maps an HTTP status code to the error kind the gateway uses for it.
///
/// Total over every `u16`: unrecognised codes, including unlisted 4xx codes,
/// all 5xx codes and success codes, resolve to [`ErrorKind::InternalServer`].
///
/// # Examples
///
/// ```
/// use beanstream::errors::{classify, ErrorKind};
///
/// assert_eq!(classify(302), ErrorKind::Redirection);
/// assert_eq!(classify(415), ErrorKind::InvalidRequest);
/// assert_eq!(classify(404), ErrorKind::InternalServer);
/// ```
pub fn classify(status: u16) -> ErrorKind {
    match status {
        302 => ErrorKind::Redirection,
        400 | 405 | 415 => ErrorKind::InvalidRequest,
        401 => ErrorKind::UnAuthorized,
        402 => ErrorKind::BusinessRule,
        403 => ErrorKind::Forbidden,
        _ => ErrorKind::InternalServer,
    }
}

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum BeanstreamError {
    /// Local configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller supplied invalid transaction parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// The transaction already left the `Built` state
    #[error("Transaction {order_number} was already committed")]
    AlreadyCommitted {
        /// Order number of the transaction that was committed twice
        order_number: String,
    },

    /// Gateway redirected the request (302)
    #[error("Gateway redirected the request (status {status})")]
    Redirection {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway rejected the request as malformed (400, 405, 415)
    #[error("Invalid request (status {status})")]
    InvalidRequest {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway rejected the credentials (401)
    #[error("Unauthorized (status {status})")]
    UnAuthorized {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway refused the call on business-rule grounds (402)
    #[error("Business rule violation (status {status})")]
    BusinessRule {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway forbade the call (403)
    #[error("Forbidden (status {status})")]
    Forbidden {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Any other non-success status
    #[error("Internal server error (status {status})")]
    InternalServer {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway demanded a request hash that was not supplied
    #[error("Hash validation required by gateway")]
    HashValidation,

    /// Generic API failure
    #[error("API error: {0}")]
    Api(String),

    /// Network-level failure (DNS, TLS, timeout, connection)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BeanstreamError {
    /// Builds the error variant for a non-success gateway status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match classify(status) {
            ErrorKind::Redirection => BeanstreamError::Redirection { status, body },
            ErrorKind::InvalidRequest => BeanstreamError::InvalidRequest { status, body },
            ErrorKind::UnAuthorized => BeanstreamError::UnAuthorized { status, body },
            ErrorKind::BusinessRule => BeanstreamError::BusinessRule { status, body },
            ErrorKind::Forbidden => BeanstreamError::Forbidden { status, body },
            ErrorKind::InternalServer
            | ErrorKind::Configuration
            | ErrorKind::Validation
            | ErrorKind::Api => BeanstreamError::InternalServer { status, body },
        }
    }

    /// Returns the kind of this error.
    ///
    /// `Transport` and `HashValidation` are unclassified and return `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BeanstreamError::Configuration(_) => Some(ErrorKind::Configuration),
            BeanstreamError::Validation(_) | BeanstreamError::AlreadyCommitted { .. } => {
                Some(ErrorKind::Validation)
            }
            BeanstreamError::Redirection { .. } => Some(ErrorKind::Redirection),
            BeanstreamError::InvalidRequest { .. } => Some(ErrorKind::InvalidRequest),
            BeanstreamError::UnAuthorized { .. } => Some(ErrorKind::UnAuthorized),
            BeanstreamError::BusinessRule { .. } => Some(ErrorKind::BusinessRule),
            BeanstreamError::Forbidden { .. } => Some(ErrorKind::Forbidden),
            BeanstreamError::InternalServer { .. } => Some(ErrorKind::InternalServer),
            BeanstreamError::Api(_) => Some(ErrorKind::Api),
            BeanstreamError::HashValidation | BeanstreamError::Transport(_) => None,
        }
    }

    /// HTTP status reported by the gateway, for status-classified errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            BeanstreamError::Redirection { status, .. }
            | BeanstreamError::InvalidRequest { status, .. }
            | BeanstreamError::UnAuthorized { status, .. }
            | BeanstreamError::BusinessRule { status, .. }
            | BeanstreamError::Forbidden { status, .. }
            | BeanstreamError::InternalServer { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, BeanstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(302), ErrorKind::Redirection);
        assert_eq!(classify(400), ErrorKind::InvalidRequest);
        assert_eq!(classify(405), ErrorKind::InvalidRequest);
        assert_eq!(classify(415), ErrorKind::InvalidRequest);
        assert_eq!(classify(401), ErrorKind::UnAuthorized);
        assert_eq!(classify(402), ErrorKind::BusinessRule);
        assert_eq!(classify(403), ErrorKind::Forbidden);
    }

    #[test]
    fn test_classify_fallback() {
        for status in [0, 100, 200, 201, 301, 303, 404, 406, 450, 499, 500, 503, 599, u16::MAX] {
            assert_eq!(classify(status), ErrorKind::InternalServer, "status {status}");
        }
    }

    #[test]
    fn test_classify_range_300_to_499() {
        for status in 300..500u16 {
            let expected = match status {
                302 => ErrorKind::Redirection,
                400 | 405 | 415 => ErrorKind::InvalidRequest,
                401 => ErrorKind::UnAuthorized,
                402 => ErrorKind::BusinessRule,
                403 => ErrorKind::Forbidden,
                _ => ErrorKind::InternalServer,
            };
            assert_eq!(classify(status), expected);
            assert_eq!(classify(status), classify(status));
        }
    }

    #[test]
    fn test_from_status_matches_classify() {
        for status in 0..1000u16 {
            let err = BeanstreamError::from_status(status, "");
            assert_eq!(err.kind(), Some(classify(status)));
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn test_error_display() {
        let err = BeanstreamError::Validation("too many ref fields".to_string());
        assert_eq!(err.to_string(), "Validation error: too many ref fields");

        let err = BeanstreamError::from_status(403, "nope");
        assert_eq!(err.to_string(), "Forbidden (status 403)");

        assert_eq!(
            BeanstreamError::HashValidation.to_string(),
            "Hash validation required by gateway"
        );
    }

    #[test]
    fn test_unclassified_kinds() {
        assert_eq!(BeanstreamError::HashValidation.kind(), None);
        assert_eq!(BeanstreamError::HashValidation.status(), None);
        assert_eq!(
            BeanstreamError::Configuration("x".into()).kind(),
            Some(ErrorKind::Configuration)
        );
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
