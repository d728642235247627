//! HTTP transport abstraction for the M-Pesa gateway
//!
//! Defines the `HttpClient` trait that decouples the authenticator and the
//! domain operations from the HTTP stack. `ReqwestHttpClient` is the
//! production implementation; tests inject a scripted client instead.
//!
//! Every failure surfaces as one `Error` carrying an `ErrorCode` from the
//! flat taxonomy (`HTTP_<status>`, `REQUEST_TIMEOUT`, `CONNECTION_ERROR`,
//! `REQUEST_FAILED`, plus the two authentication codes raised upstream of
//! the transport).

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod reqwest_client;
pub mod retry;

pub use error::{Error, ErrorCode, Result};
pub use reqwest_client::{DEFAULT_TIMEOUT, ReqwestHttpClient};
pub use retry::{RetryPolicy, with_retry};

pub use reqwest::header::{HeaderMap, HeaderValue};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by `HttpClient` methods.
pub type ResponseFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'a>>;

/// Capability to issue JSON requests against the gateway.
///
/// Paths are relative to the implementation's base URL (for example
/// `/oauth/v1/generate`). Both methods resolve to the decoded JSON body on
/// a 2xx status and to a classified `Error` otherwise.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn HttpClient>`).
pub trait HttpClient: Send + Sync {
    fn get<'a>(
        &'a self,
        path: &'a str,
        headers: &'a HeaderMap,
        params: &'a [(&'a str, &'a str)],
    ) -> ResponseFuture<'a>;

    fn post<'a>(
        &'a self,
        path: &'a str,
        body: &'a serde_json::Value,
        headers: &'a HeaderMap,
    ) -> ResponseFuture<'a>;
}
