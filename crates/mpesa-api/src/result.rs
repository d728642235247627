//! Asynchronous request/result plumbing shared by B2C, account balance,
//! reversal and transaction status.
//!
//! These APIs answer the POST with an `Acknowledgement` that only confirms
//! acceptance. The outcome arrives later as a `ResultCallback` on the
//! request's `ResultURL`, or as the same shape on `QueueTimeOutURL` when the
//! request timed out in the gateway's queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{Normalized, ResultCode};

/// Synchronous acceptance of an asynchronous request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(rename = "OriginatorConversationID", default)]
    pub originator_conversation_id: String,
    #[serde(rename = "ConversationID", default)]
    pub conversation_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
}

impl Normalized for Acknowledgement {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_code.as_ref()
    }
}

/// One `{"Key": ..., "Value": ...}` result parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultParameter {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

/// Body POSTed to `ResultURL` / `QueueTimeOutURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCallback {
    #[serde(rename = "Result")]
    pub result: ResultBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    #[serde(rename = "ResultType", default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultCode>,
    #[serde(rename = "ResultCode")]
    pub result_code: Option<ResultCode>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "OriginatorConversationID", default)]
    pub originator_conversation_id: String,
    #[serde(rename = "ConversationID", default)]
    pub conversation_id: String,
    #[serde(rename = "TransactionID", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Seen as `ResultParameters.ResultParameter` and as
    /// `ResultParameter.ResultParameters`; both are read by `parameters()`
    #[serde(rename = "ResultParameters", default, skip_serializing_if = "Option::is_none")]
    pub result_parameters: Option<Value>,
    #[serde(rename = "ResultParameter", default, skip_serializing_if = "Option::is_none")]
    pub result_parameter: Option<Value>,
    #[serde(rename = "ReferenceData", default, skip_serializing_if = "Option::is_none")]
    pub reference_data: Option<Value>,
}

impl ResultCallback {
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// All result parameters, whichever nesting the gateway used and whether
    /// the inner collection is a list or a single object.
    pub fn parameters(&self) -> Vec<ResultParameter> {
        let outer = [
            (&self.result.result_parameters, "ResultParameter"),
            (&self.result.result_parameter, "ResultParameters"),
        ];
        outer
            .into_iter()
            .filter_map(|(container, inner_key)| {
                container.as_ref().and_then(|c| c.get(inner_key))
            })
            .flat_map(key_values)
            .collect()
    }

    /// Value of the parameter named `key`.
    pub fn parameter(&self, key: &str) -> Option<Value> {
        self.parameters()
            .into_iter()
            .find(|p| p.key == key)
            .map(|p| p.value)
    }

    /// Timeout notifications use `ResultType` 1.
    pub fn is_timeout(&self) -> bool {
        self.result
            .result_type
            .as_ref()
            .is_some_and(|t| t.matches(1))
    }
}

fn key_values(value: &Value) -> Vec<ResultParameter> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Value::Object(_) => serde_json::from_value(value.clone())
            .map(|p| vec![p])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

impl Normalized for ResultCallback {
    fn result_code(&self) -> Option<&ResultCode> {
        self.result.result_code.as_ref()
    }
}

/// Body the merchant returns to acknowledge a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: ResultCode,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted(desc: impl Into<String>) -> Self {
        Self {
            result_code: ResultCode::Int(0),
            result_desc: desc.into(),
        }
    }
}

impl Default for CallbackAck {
    fn default() -> Self {
        Self::accepted("Success")
    }
}
