//! reqwest-backed `HttpClient`
//!
//! Resolves paths against the environment's base URL, applies a per-request
//! timeout, and maps every outcome into the error taxonomy. Transient
//! failures go through the configured `RetryPolicy`.

use std::time::Duration;

use common::{ClientConfig, Environment};
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, with_retry};
use crate::{HttpClient, ResponseFuture};

/// Per-request timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ReqwestHttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ReqwestHttpClient {
    pub fn new(environment: Environment) -> Self {
        Self::with_base_url(environment.base_url())
    }

    /// Point the client at an arbitrary host (local test servers, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.environment)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_retry(RetryPolicy::from_config(&config.retry))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reuse an existing connection pool.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(&self, request: reqwest::RequestBuilder, path: &str) -> Result<Value> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        let decoded = serde_json::from_str::<Value>(&text).ok();

        if !status.is_success() {
            let body = decoded.unwrap_or_else(|| wrap_text(&text));
            let message = body
                .get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            warn!(path, status = status.as_u16(), error = %message, "gateway returned error status");
            return Err(Error::http(status.as_u16(), message, body));
        }

        match decoded {
            Some(body) => {
                debug!(path, status = status.as_u16(), "gateway request succeeded");
                Ok(body)
            }
            None => Err(Error::request_failed("gateway returned a non-JSON body")
                .with_status(status.as_u16())
                .with_raw_response(wrap_text(&text))),
        }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get<'a>(
        &'a self,
        path: &'a str,
        headers: &'a HeaderMap,
        params: &'a [(&'a str, &'a str)],
    ) -> ResponseFuture<'a> {
        Box::pin(async move {
            let url = self.url(path);
            with_retry(&self.retry, || {
                let request = self
                    .client
                    .get(&url)
                    .headers(headers.clone())
                    .query(params);
                self.send_once(request, path)
            })
            .await
        })
    }

    fn post<'a>(
        &'a self,
        path: &'a str,
        body: &'a Value,
        headers: &'a HeaderMap,
    ) -> ResponseFuture<'a> {
        Box::pin(async move {
            let url = self.url(path);
            with_retry(&self.retry, || {
                let request = self.client.post(&url).headers(headers.clone()).json(body);
                self.send_once(request, path)
            })
            .await
        })
    }
}

/// Map a reqwest failure onto the taxonomy.
fn classify_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout()
    } else if e.is_connect() {
        Error::connection()
    } else {
        Error::request_failed(format!("HTTP request failed: {e}"))
    }
}

/// Non-JSON bodies are surfaced as `{"errorMessage": <trimmed text>}`.
fn wrap_text(text: &str) -> Value {
    serde_json::json!({ "errorMessage": text.trim() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::Router;
    use axum::extract::{Json, Query};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Start a local gateway double and return its base URL.
    async fn start_gateway(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn echo_router() -> Router {
        Router::new()
            .route(
                "/oauth/v1/generate",
                get(
                    |headers: AxumHeaders, Query(q): Query<HashMap<String, String>>| async move {
                        Json(serde_json::json!({
                            "authorization": headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or(""),
                            "grant_type": q.get("grant_type").cloned().unwrap_or_default(),
                        }))
                    },
                ),
            )
            .route(
                "/mpesa/stkpush/v1/processrequest",
                post(|Json(body): Json<Value>| async move {
                    Json(serde_json::json!({ "echo": body }))
                }),
            )
            .route(
                "/bad-request",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({"errorMessage": "Bad Request - Invalid PhoneNumber"})),
                    )
                }),
            )
            .route(
                "/plain-500",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n") }),
            )
            .route("/plain-200", get(|| async { "not json" }))
    }

    #[tokio::test]
    async fn get_sends_headers_and_query() {
        let base = start_gateway(echo_router()).await;
        let client = ReqwestHttpClient::with_base_url(base).with_retry(RetryPolicy::none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic abc".parse().unwrap());
        let body = client
            .get(
                "/oauth/v1/generate",
                &headers,
                &[("grant_type", "client_credentials")],
            )
            .await
            .unwrap();

        assert_eq!(body["authorization"], "Basic abc");
        assert_eq!(body["grant_type"], "client_credentials");
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let base = start_gateway(echo_router()).await;
        let client = ReqwestHttpClient::with_base_url(base).with_retry(RetryPolicy::none());

        let payload = serde_json::json!({"Amount": 10});
        let body = client
            .post(
                "/mpesa/stkpush/v1/processrequest",
                &payload,
                &HeaderMap::new(),
            )
            .await
            .unwrap();
        assert_eq!(body["echo"]["Amount"], 10);
    }

    #[tokio::test]
    async fn error_status_uses_error_message_field() {
        let base = start_gateway(echo_router()).await;
        let client = ReqwestHttpClient::with_base_url(base).with_retry(RetryPolicy::none());

        let err = client
            .post("/bad-request", &Value::Null, &HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Http(400));
        assert_eq!(err.status, Some(400));
        assert!(err.message.contains("Invalid PhoneNumber"));
    }

    #[tokio::test]
    async fn non_json_error_body_is_wrapped() {
        let base = start_gateway(echo_router()).await;
        let client = ReqwestHttpClient::with_base_url(base).with_retry(RetryPolicy::none());

        let err = client
            .get("/plain-500", &HeaderMap::new(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Http(500));
        assert_eq!(err.message, "Internal Server Error");
        assert_eq!(
            err.raw_response.unwrap()["errorMessage"],
            "Internal Server Error"
        );
    }

    #[tokio::test]
    async fn non_json_success_body_is_request_failed() {
        let base = start_gateway(echo_router()).await;
        let client = ReqwestHttpClient::with_base_url(base).with_retry(RetryPolicy::none());

        let err = client
            .get("/plain-200", &HeaderMap::new(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestFailed);
        assert_eq!(err.status, Some(200));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        let client =
            ReqwestHttpClient::with_base_url("http://127.0.0.1:1").with_retry(RetryPolicy::none());
        let err = client
            .get("/oauth/v1/generate", &HeaderMap::new(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionError);
    }

    #[tokio::test]
    async fn slow_gateway_times_out_after_three_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/slow",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }
            }),
        );
        let base = start_gateway(app).await;
        let client = ReqwestHttpClient::with_base_url(base)
            .with_timeout(Duration::from_millis(100))
            .with_retry(RetryPolicy {
                max_attempts: 3,
                wait: Duration::from_millis(10),
            });

        let err = client
            .get("/slow", &HeaderMap::new(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestTimeout);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn environment_selects_base_url() {
        assert_eq!(
            ReqwestHttpClient::new(Environment::Production).base_url(),
            "https://api.safaricom.co.ke"
        );
        assert_eq!(
            ReqwestHttpClient::new(Environment::Sandbox).base_url(),
            "https://sandbox.safaricom.co.ke"
        );
    }

    #[test]
    fn plain_text_is_trimmed_into_error_message() {
        assert_eq!(
            wrap_text("  oops \n"),
            serde_json::json!({"errorMessage": "oops"})
        );
    }
}
