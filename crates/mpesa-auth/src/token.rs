//! Token endpoint exchange
//!
//! One interaction: `GET /oauth/v1/generate?grant_type=client_credentials`
//! with `Authorization: Basic base64(key:secret)`. The gateway answers
//! `{"access_token": "...", "expires_in": "3599"}`; `expires_in` arrives as
//! either a number or a numeral string.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tokio::time::Instant;
use transport::{Error, ErrorCode, HeaderMap, HeaderValue, HttpClient, Result};

use crate::constants::{DEFAULT_TTL_SECS, GRANT_TYPE, TOKEN_PATH};
use crate::credentials::Credential;

/// Decoded token endpoint body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds until the token expires, relative to issuance
    pub expires_in: u64,
}

impl TokenResponse {
    /// Extract the token from a 2xx body.
    ///
    /// A missing or empty `access_token` is `TOKEN_MISSING` carrying the
    /// body. An absent, non-positive or unparseable `expires_in` falls back
    /// to `DEFAULT_TTL_SECS`.
    pub fn from_body(body: Value) -> Result<Self> {
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned);

        let Some(access_token) = access_token else {
            return Err(Error::new(
                ErrorCode::TokenMissing,
                "No access token returned by Mpesa API.",
            )
            .with_raw_response(body));
        };

        let expires_in = body
            .get("expires_in")
            .and_then(parse_expires_in)
            .unwrap_or(DEFAULT_TTL_SECS);

        Ok(Self {
            access_token,
            expires_in,
        })
    }

    pub fn into_credential(self, issued_at: Instant) -> Credential {
        Credential::new(self.access_token, issued_at, self.expires_in)
    }
}

fn parse_expires_in(value: &Value) -> Option<u64> {
    let secs = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (secs > 0).then_some(secs)
}

/// `Basic base64(consumer_key:consumer_secret)`
pub fn basic_auth_header(consumer_key: &str, consumer_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{consumer_key}:{consumer_secret}"));
    format!("Basic {encoded}")
}

/// Perform the client-credentials exchange.
///
/// A 400 without an error message is how the gateway reports a bad
/// key/secret pair and becomes `AUTH_INVALID_CREDENTIALS`. Every other
/// transport error is returned unchanged.
pub async fn request_token(
    http: &dyn HttpClient,
    consumer_key: &str,
    consumer_secret: &str,
) -> Result<TokenResponse> {
    let mut headers = HeaderMap::new();
    let authorization = HeaderValue::from_str(&basic_auth_header(consumer_key, consumer_secret))
        .map_err(|e| Error::request_failed(format!("invalid authorization header: {e}")))?;
    headers.insert("authorization", authorization);

    let body = match http
        .get(TOKEN_PATH, &headers, &[("grant_type", GRANT_TYPE)])
        .await
    {
        Ok(body) => body,
        Err(e) if e.code == ErrorCode::Http(400) && e.message.is_empty() => {
            let mut err = Error::new(
                ErrorCode::AuthInvalidCredentials,
                "Invalid credentials provided. Please check your consumer key and secret.",
            )
            .with_status(400);
            err.raw_response = e.raw_response;
            return Err(err);
        }
        Err(e) => return Err(e),
    };

    TokenResponse::from_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::mock::MockHttpClient;

    #[test]
    fn basic_auth_header_encodes_key_and_secret() {
        // base64("key:secret")
        assert_eq!(basic_auth_header("key", "secret"), "Basic a2V5OnNlY3JldA==");
    }

    #[test]
    fn expires_in_accepts_number_or_string() {
        let numeric =
            TokenResponse::from_body(serde_json::json!({"access_token": "a", "expires_in": 3599}))
                .unwrap();
        assert_eq!(numeric.expires_in, 3599);

        let string = TokenResponse::from_body(
            serde_json::json!({"access_token": "a", "expires_in": " 3599 "}),
        )
        .unwrap();
        assert_eq!(string.expires_in, 3599);
    }

    #[test]
    fn expires_in_defaults_when_absent_or_invalid() {
        for body in [
            serde_json::json!({"access_token": "a"}),
            serde_json::json!({"access_token": "a", "expires_in": "soon"}),
            serde_json::json!({"access_token": "a", "expires_in": 0}),
            serde_json::json!({"access_token": "a", "expires_in": null}),
        ] {
            assert_eq!(
                TokenResponse::from_body(body).unwrap().expires_in,
                DEFAULT_TTL_SECS
            );
        }
    }

    #[test]
    fn empty_access_token_is_token_missing() {
        let body = serde_json::json!({"access_token": "", "expires_in": "3599"});
        let err = TokenResponse::from_body(body.clone()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenMissing);
        assert_eq!(err.status, None);
        assert_eq!(err.raw_response, Some(body));
    }

    #[tokio::test]
    async fn request_sends_basic_auth_and_grant_type() {
        let mock = MockHttpClient::new();
        mock.push_response(serde_json::json!({"access_token": "abc", "expires_in": "3599"}));

        let response = request_token(&mock, "key", "secret").await.unwrap();
        assert_eq!(response.access_token, "abc");

        let calls = mock.calls();
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].path, TOKEN_PATH);
        assert_eq!(calls[0].header("authorization"), Some("Basic a2V5OnNlY3JldA=="));
        assert_eq!(
            calls[0].params,
            vec![("grant_type".to_owned(), "client_credentials".to_owned())]
        );
    }

    #[tokio::test]
    async fn bare_400_is_invalid_credentials() {
        let mock = MockHttpClient::new();
        mock.push_error(Error::http(400, "", serde_json::json!({"errorMessage": ""})));

        let err = request_token(&mock, "bad", "creds").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalidCredentials);
        assert_eq!(err.status, Some(400));
    }

    #[tokio::test]
    async fn described_400_stays_http_error() {
        let mock = MockHttpClient::new();
        mock.push_error(Error::http(
            400,
            "Invalid grant type passed",
            serde_json::json!({"errorMessage": "Invalid grant type passed"}),
        ));

        let err = request_token(&mock, "key", "secret").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Http(400));
        assert_eq!(err.message, "Invalid grant type passed");
    }

    #[tokio::test]
    async fn whitespace_400_message_stays_http_error() {
        let mock = MockHttpClient::new();
        mock.push_error(Error::http(400, " ", serde_json::json!({"errorMessage": " "})));

        let err = request_token(&mock, "key", "secret").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Http(400));
        assert_eq!(err.message, " ");
    }

    #[tokio::test]
    async fn other_statuses_pass_through() {
        let mock = MockHttpClient::new();
        mock.push_error(Error::http(503, "", serde_json::json!({})));

        let err = request_token(&mock, "key", "secret").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Http(503));
    }
}
