//! Callback metadata items
//!
//! STK push callbacks carry `CallbackMetadata.Item`, a list of
//! `{"Name": ..., "Value": ...}` pairs whose value types vary by name. The
//! `Balance` item sometimes arrives as the string
//! `"{Amount={BasicAmount=123.45, MinLimit=0.00}}"`; it is normalized to a
//! number when the embedded amount parses and left untouched otherwise.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static BASIC_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BasicAmount=([0-9]+\.?[0-9]*)").unwrap_or_else(|_| unreachable!())
});

/// One named metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMetadataItem")]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Deserialize)]
struct RawMetadataItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value", default)]
    value: Option<Value>,
}

impl From<RawMetadataItem> for MetadataItem {
    fn from(raw: RawMetadataItem) -> Self {
        let value = if raw.name == "Balance" {
            raw.value.map(normalize_balance)
        } else {
            raw.value
        };
        Self {
            name: raw.name,
            value,
        }
    }
}

/// Extract `BasicAmount` from the balance micro-format.
///
/// Only strings containing `{Amount={` are inspected. Anything that does
/// not yield a finite float is returned unchanged.
pub fn normalize_balance(value: Value) -> Value {
    let Value::String(raw) = &value else {
        return value;
    };
    if !raw.contains("{Amount={") {
        return value;
    }
    BASIC_AMOUNT
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(value)
}

/// Numeric view of a metadata value (numbers or numeral strings).
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String view of a metadata value; numbers render without a fraction
/// when they are whole (phone numbers, `yyyyMMddHHmmss` dates).
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Look up an item by name.
pub fn find<'a>(items: &'a [MetadataItem], name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.name == name)
        .and_then(|item| item.value.as_ref())
}
