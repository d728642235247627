//! Tolerant result-code normalization
//!
//! The gateway encodes its status codes inconsistently: `0`, `"0"`, `"00"`,
//! `" 0 "` and `"200"` all show up depending on the endpoint. `ResultCode`
//! captures whatever arrived and `Normalized` turns it into one boolean,
//! compared against a sentinel chosen per response type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A status code exactly as the gateway sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultCode {
    Int(i64),
    Text(String),
    /// Anything else (floats, booleans, objects); never successful
    Other(Value),
}

impl ResultCode {
    /// Integer value after coercion.
    ///
    /// Strings are trimmed and accepted when they are an optional sign
    /// followed only by ASCII digits. Everything else is `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ResultCode::Int(n) => Some(*n),
            ResultCode::Text(s) => parse_numeral(s),
            ResultCode::Other(_) => None,
        }
    }

    pub fn matches(&self, sentinel: i64) -> bool {
        self.as_i64() == Some(sentinel)
    }
}

impl From<i64> for ResultCode {
    fn from(value: i64) -> Self {
        ResultCode::Int(value)
    }
}

impl From<&str> for ResultCode {
    fn from(value: &str) -> Self {
        ResultCode::Text(value.to_owned())
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Int(n) => write!(f, "{n}"),
            ResultCode::Text(s) => f.write_str(s),
            ResultCode::Other(v) => write!(f, "{v}"),
        }
    }
}

fn parse_numeral(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Success check shared by every response and callback model.
pub trait Normalized {
    /// Code value that means success for this payload type
    const SUCCESS_CODE: i64 = 0;

    /// The field carrying this payload's status code, if present.
    fn result_code(&self) -> Option<&ResultCode>;

    /// True only when the code is present and coerces to `SUCCESS_CODE`.
    fn is_successful(&self) -> bool {
        self.result_code()
            .is_some_and(|code| code.matches(Self::SUCCESS_CODE))
    }
}
