//! Scripted `HttpClient` for tests
//!
//! Responses are queued up front and handed out in order; every call is
//! recorded so tests can assert on paths, headers, params and bodies.

use std::collections::VecDeque;
use std::sync::Mutex;

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::{HttpClient, ResponseFuture};

/// One recorded request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub headers: HeaderMap,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedCall {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, body: Value) -> &Self {
        self.lock_responses().push_back(Ok(body));
        self
    }

    pub fn push_error(&self, error: Error) -> &Self {
        self.lock_responses().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Value>>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn respond(&self, call: RecordedCall) -> Result<Value> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        self.lock_responses().pop_front().unwrap_or_else(|| {
            Err(Error::request_failed("mock: no scripted response left"))
        })
    }
}

impl HttpClient for MockHttpClient {
    fn get<'a>(
        &'a self,
        path: &'a str,
        headers: &'a HeaderMap,
        params: &'a [(&'a str, &'a str)],
    ) -> ResponseFuture<'a> {
        let result = self.respond(RecordedCall {
            method: "GET",
            path: path.to_owned(),
            headers: headers.clone(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body: None,
        });
        Box::pin(async move { result })
    }

    fn post<'a>(
        &'a self,
        path: &'a str,
        body: &'a Value,
        headers: &'a HeaderMap,
    ) -> ResponseFuture<'a> {
        let result = self.respond(RecordedCall {
            method: "POST",
            path: path.to_owned(),
            headers: headers.clone(),
            params: Vec::new(),
            body: Some(body.clone()),
        });
        Box::pin(async move { result })
    }
}
