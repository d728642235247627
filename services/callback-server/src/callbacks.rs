//! STK push callback receiver
//!
//! Endpoints:
//! - `POST /mpesa/callback`: parse, record and acknowledge a callback
//! - `GET /mpesa/callback/received`: every stored record
//! - `GET /mpesa/callback/latest`: most recent record, 404 when empty
//! - `POST /mpesa/callback/clear`: drop all records

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use chrono::Utc;
use mpesa_api::{CallbackAck, Normalized, StkCallback};
use serde_json::Value;
use tracing::{info, warn};

use crate::metrics::record_callback;
use crate::store::{CallbackRecord, CallbackStore};

pub fn callback_routes() -> Router<Arc<CallbackStore>> {
    Router::new()
        .route("/mpesa/callback", post(receive_callback))
        .route("/mpesa/callback/received", get(list_callbacks))
        .route("/mpesa/callback/latest", get(latest_callback))
        .route("/mpesa/callback/clear", post(clear_callbacks))
}

fn json_response(status: StatusCode, body: Value) -> impl IntoResponse {
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// POST /mpesa/callback. The gateway only needs the acknowledgement; the
/// payment outcome is recorded whether it succeeded or not.
async fn receive_callback(
    State(store): State<Arc<CallbackStore>>,
    body: Bytes,
) -> axum::response::Response {
    let request_id = format!("cb_{}", uuid::Uuid::new_v4().as_simple());

    let parsed = serde_json::from_slice::<Value>(&body).and_then(|payload| {
        serde_json::from_value::<StkCallback>(payload.clone()).map(|callback| (payload, callback))
    });
    let (payload, callback) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(request_id, error = %e, "rejected malformed callback");
            record_callback("invalid");
            return json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "ResultCode": 1,
                    "ResultDesc": format!("Invalid callback payload: {e}"),
                }),
            )
            .into_response();
        }
    };

    let record = CallbackRecord::new(request_id.clone(), Utc::now(), &callback, payload);
    info!(
        request_id,
        checkout_request_id = %record.checkout_request_id,
        result_code = record.result_code.as_deref().unwrap_or_default(),
        successful = record.successful,
        "STK callback received"
    );
    record_callback(if callback.is_successful() {
        "success"
    } else {
        "failed"
    });
    store.push(record).await;

    let ack = serde_json::to_value(CallbackAck::default()).unwrap_or_default();
    json_response(StatusCode::OK, ack).into_response()
}

/// GET /mpesa/callback/received
async fn list_callbacks(State(store): State<Arc<CallbackStore>>) -> impl IntoResponse {
    let callbacks = store.all().await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "count": callbacks.len(),
            "callbacks": callbacks,
        }),
    )
}

/// GET /mpesa/callback/latest
async fn latest_callback(State(store): State<Arc<CallbackStore>>) -> axum::response::Response {
    match store.latest().await {
        Some(record) => json_response(
            StatusCode::OK,
            serde_json::to_value(record).unwrap_or_default(),
        )
        .into_response(),
        None => json_response(
            StatusCode::NOT_FOUND,
            serde_json::json!({"error": "no callbacks received"}),
        )
        .into_response(),
    }
}

/// POST /mpesa/callback/clear
async fn clear_callbacks(State(store): State<Arc<CallbackStore>>) -> impl IntoResponse {
    let cleared = store.clear().await;
    info!(cleared, "callback records cleared");
    json_response(StatusCode::OK, serde_json::json!({ "cleared": cleared }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(store: Arc<CallbackStore>) -> Router {
        callback_routes().with_state(store)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    const PAID: &str = r#"{
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        {"Name": "Amount", "Value": 1.00},
                        {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                        {"Name": "Balance"},
                        {"Name": "TransactionDate", "Value": 20191219102115},
                        {"Name": "PhoneNumber", "Value": 254708374149}
                    ]
                }
            }
        }
    }"#;

    #[tokio::test]
    async fn callback_is_acknowledged_and_stored() {
        let store = Arc::new(CallbackStore::new(10));
        let response = app(store.clone())
            .oneshot(post_json("/mpesa/callback", PAID))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"ResultCode": 0, "ResultDesc": "Success"})
        );

        let latest = store.latest().await.unwrap();
        assert!(latest.successful);
        assert!(latest.request_id.starts_with("cb_"));
        assert_eq!(latest.amount, Some(1.0));
        assert_eq!(latest.mpesa_receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(latest.phone_number.as_deref(), Some("254708374149"));
    }

    #[tokio::test]
    async fn failed_payment_is_still_acknowledged() {
        let store = Arc::new(CallbackStore::new(10));
        let body = r#"{"Body":{"stkCallback":{"MerchantRequestID":"1","CheckoutRequestID":"2","ResultCode":"1032","ResultDesc":"Request cancelled by user"}}}"#;
        let response = app(store.clone())
            .oneshot(post_json("/mpesa/callback", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let latest = store.latest().await.unwrap();
        assert!(!latest.successful);
        assert_eq!(latest.result_code.as_deref(), Some("1032"));
    }

    #[tokio::test]
    async fn invalid_json_is_400_and_not_stored() {
        let store = Arc::new(CallbackStore::new(10));
        let response = app(store.clone())
            .oneshot(post_json("/mpesa/callback", "not json {"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn wrong_shape_is_400() {
        let store = Arc::new(CallbackStore::new(10));
        let response = app(store.clone())
            .oneshot(post_json("/mpesa/callback", r#"{"Result": {}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn latest_is_404_when_empty() {
        let store = Arc::new(CallbackStore::new(10));
        let response = app(store)
            .oneshot(get("/mpesa/callback/latest"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn received_lists_and_clear_empties() {
        let store = Arc::new(CallbackStore::new(10));
        for _ in 0..2 {
            app(store.clone())
                .oneshot(post_json("/mpesa/callback", PAID))
                .await
                .unwrap();
        }

        let listed = body_json(
            app(store.clone())
                .oneshot(get("/mpesa/callback/received"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(listed["count"], 2);
        assert_eq!(listed["callbacks"].as_array().unwrap().len(), 2);

        let cleared = body_json(
            app(store.clone())
                .oneshot(post_json("/mpesa/callback/clear", ""))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(cleared["cleared"], 2);
        assert_eq!(store.len().await, 0);
    }
}
