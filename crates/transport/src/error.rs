//! Classified gateway errors

use std::fmt;

/// Machine-readable classification of a failed gateway interaction.
///
/// Renders as the wire-style code (`AUTH_INVALID_CREDENTIALS`, `HTTP_404`, ...)
/// so callers can match on the enum or log the string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Token endpoint answered 400 without an error message
    AuthInvalidCredentials,
    /// Token endpoint answered 2xx without an `access_token`
    TokenMissing,
    /// Non-2xx status from the gateway
    Http(u16),
    RequestTimeout,
    ConnectionError,
    /// Anything the transport could not classify further
    RequestFailed,
}

impl ErrorCode {
    /// Timeouts and connection failures are the only retryable classes.
    /// HTTP statuses (4xx and 5xx alike) are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::RequestTimeout | ErrorCode::ConnectionError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::AuthInvalidCredentials => f.write_str("AUTH_INVALID_CREDENTIALS"),
            ErrorCode::TokenMissing => f.write_str("TOKEN_MISSING"),
            ErrorCode::Http(status) => write!(f, "HTTP_{status}"),
            ErrorCode::RequestTimeout => f.write_str("REQUEST_TIMEOUT"),
            ErrorCode::ConnectionError => f.write_str("CONNECTION_ERROR"),
            ErrorCode::RequestFailed => f.write_str("REQUEST_FAILED"),
        }
    }
}

/// The single error type for authentication and transport failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// HTTP status, when the gateway answered at all
    pub status: Option<u16>,
    /// Decoded response body kept for diagnostics
    pub raw_response: Option<serde_json::Value>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            raw_response: None,
        }
    }

    /// Non-2xx response; `message` is the body's `errorMessage` (may be empty).
    pub fn http(status: u16, message: impl Into<String>, raw_response: serde_json::Value) -> Self {
        Self {
            code: ErrorCode::Http(status),
            message: message.into(),
            status: Some(status),
            raw_response: Some(raw_response),
        }
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::RequestTimeout, "Request to Mpesa timed out.")
    }

    pub fn connection() -> Self {
        Self::new(
            ErrorCode::ConnectionError,
            "Failed to connect to Mpesa API. Check network or URL.",
        )
    }

    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestFailed, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_raw_response(mut self, raw_response: serde_json::Value) -> Self {
        self.raw_response = Some(raw_response);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_as_wire_strings() {
        assert_eq!(
            ErrorCode::AuthInvalidCredentials.to_string(),
            "AUTH_INVALID_CREDENTIALS"
        );
        assert_eq!(ErrorCode::TokenMissing.to_string(), "TOKEN_MISSING");
        assert_eq!(ErrorCode::Http(503).to_string(), "HTTP_503");
        assert_eq!(ErrorCode::RequestTimeout.to_string(), "REQUEST_TIMEOUT");
        assert_eq!(ErrorCode::ConnectionError.to_string(), "CONNECTION_ERROR");
        assert_eq!(ErrorCode::RequestFailed.to_string(), "REQUEST_FAILED");
    }

    #[test]
    fn only_network_classes_are_retryable() {
        assert!(ErrorCode::RequestTimeout.is_retryable());
        assert!(ErrorCode::ConnectionError.is_retryable());
        assert!(!ErrorCode::Http(400).is_retryable());
        assert!(!ErrorCode::Http(503).is_retryable());
        assert!(!ErrorCode::RequestFailed.is_retryable());
        assert!(!ErrorCode::TokenMissing.is_retryable());
    }

    #[test]
    fn http_error_carries_status_and_body() {
        let body = serde_json::json!({"errorMessage": "Bad Request"});
        let err = Error::http(400, "Bad Request", body.clone());
        assert_eq!(err.code, ErrorCode::Http(400));
        assert_eq!(err.status, Some(400));
        assert_eq!(err.raw_response, Some(body));
        assert_eq!(err.to_string(), "HTTP_400: Bad Request");
    }

    #[test]
    fn network_errors_have_no_status() {
        assert_eq!(Error::timeout().status, None);
        assert_eq!(Error::connection().code, ErrorCode::ConnectionError);
        assert!(Error::connection().raw_response.is_none());
    }
}
