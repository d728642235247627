//! In-memory record of received STK callbacks

use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use mpesa_api::{Normalized, StkCallback};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

/// Normalized view of one callback, as served by the inspection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackRecord {
    pub request_id: String,
    pub received_at: String,
    pub result_code: Option<String>,
    pub result_desc: String,
    pub successful: bool,
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub amount: Option<f64>,
    pub mpesa_receipt_number: Option<String>,
    pub transaction_date: Option<String>,
    pub phone_number: Option<String>,
    pub payload: Value,
}

impl CallbackRecord {
    pub fn new(
        request_id: String,
        received_at: DateTime<Utc>,
        callback: &StkCallback,
        payload: Value,
    ) -> Self {
        let result = callback.result();
        Self {
            request_id,
            received_at: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            result_code: callback.result_code().map(ToString::to_string),
            result_desc: result.result_desc.clone(),
            successful: callback.is_successful(),
            merchant_request_id: result.merchant_request_id.clone(),
            checkout_request_id: result.checkout_request_id.clone(),
            amount: callback.amount(),
            mpesa_receipt_number: callback.mpesa_receipt_number(),
            transaction_date: callback.transaction_date(),
            phone_number: callback.phone_number(),
            payload,
        }
    }
}

/// Bounded FIFO of records; the oldest is evicted once `capacity` is reached.
pub struct CallbackStore {
    records: Mutex<VecDeque<CallbackRecord>>,
    capacity: usize,
}

impl CallbackStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn push(&self, record: CallbackRecord) {
        let mut records = self.records.lock().await;
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// All records, oldest first.
    pub async fn all(&self) -> Vec<CallbackRecord> {
        self.records.lock().await.iter().cloned().collect()
    }

    pub async fn latest(&self) -> Option<CallbackRecord> {
        self.records.lock().await.back().cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Drop every record and return how many there were.
    pub async fn clear(&self) -> usize {
        let mut records = self.records.lock().await;
        let cleared = records.len();
        records.clear();
        cleared
    }
}
