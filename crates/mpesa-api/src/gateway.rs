//! Shared request plumbing for the service facades
//!
//! Every operation follows the same path: fetch a bearer token, POST the
//! serialized request with JSON headers, decode the body into its response
//! model. Outcomes are counted per operation.

use std::sync::Arc;

use mpesa_auth::Authenticator;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use transport::{HeaderMap, HeaderValue, HttpClient};

use crate::error::Result;
use crate::normalize::Normalized;

/// Transport plus authenticator, cloned into every facade.
#[derive(Clone)]
pub struct Gateway {
    http: Arc<dyn HttpClient>,
    auth: Arc<Authenticator>,
}

impl Gateway {
    pub fn new(http: Arc<dyn HttpClient>, auth: Arc<Authenticator>) -> Self {
        Self { http, auth }
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    /// POST `request` and decode the response into `T`.
    pub async fn post<Req, T>(&self, operation: &'static str, path: &str, request: &Req) -> Result<T>
    where
        Req: Serialize,
        T: DeserializeOwned + Normalized,
    {
        self.post_with(operation, path, request, |body| body).await
    }

    /// Like `post`, with a hook to patch the raw body before decoding.
    pub async fn post_with<Req, T, F>(
        &self,
        operation: &'static str,
        path: &str,
        request: &Req,
        patch: F,
    ) -> Result<T>
    where
        Req: Serialize,
        T: DeserializeOwned + Normalized,
        F: FnOnce(Value) -> Value,
    {
        let result = self.send(path, request).await.and_then(|body| decode(patch(body)));
        record(operation, &result);
        result
    }

    async fn send<Req: Serialize>(&self, path: &str, request: &Req) -> Result<Value> {
        let body = serde_json::to_value(request).map_err(|e| {
            transport::Error::request_failed(format!("failed to encode request: {e}"))
        })?;

        let token = self.auth.get_token(false).await?;
        let headers = bearer_headers(&token)?;

        debug!(path, "sending gateway request");
        Ok(self.http.post(path, &body, &headers).await?)
    }
}

fn bearer_headers(token: &str) -> Result<HeaderMap> {
    let authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
        transport::Error::request_failed(format!("invalid bearer token header: {e}"))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert("authorization", authorization);
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Decode a response body; a shape mismatch is `REQUEST_FAILED` carrying
/// the raw body.
pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    match serde_json::from_value::<T>(body.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(e) => Err(transport::Error::request_failed(format!(
            "unexpected response from Mpesa API: {e}"
        ))
        .with_raw_response(body)
        .into()),
    }
}

fn record<T: Normalized>(operation: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(response) if response.is_successful() => "success",
        Ok(response) => {
            warn!(
                operation,
                code = %response.result_code().map(ToString::to_string).unwrap_or_default(),
                "gateway rejected request"
            );
            "rejected"
        }
        Err(e) => {
            warn!(operation, error = %e, "gateway request failed");
            "error"
        }
    };
    metrics::counter!("mpesa_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}
