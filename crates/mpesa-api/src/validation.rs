//! Request field validation
//!
//! Checks run before any token is fetched or request sent, so a malformed
//! request never costs a network round trip.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{Error, Result};

pub const ACCOUNT_REFERENCE_MAX: usize = 12;
pub const TRANSACTION_DESC_MAX: usize = 13;
pub const REMARKS_MAX: usize = 100;
pub const OCCASION_MAX: usize = 100;
pub const C2B_RESULT_DESC_MAX: usize = 90;

/// East Africa Time, the gateway's clock for STK timestamps
const EAT_OFFSET_SECS: i32 = 3 * 3600;

/// Normalize a Kenyan MSISDN to the `2547XXXXXXXX` form.
///
/// Accepts `07XXXXXXXX`, `+2547XXXXXXXX` and `2547XXXXXXXX` with any
/// whitespace in between. Returns `None` for anything else.
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let normalized = if compact.starts_with('+') {
        digits.to_owned()
    } else if let Some(local) = digits.strip_prefix('0') {
        format!("254{local}")
    } else {
        digits.to_owned()
    };

    (normalized.len() == 12 && normalized.starts_with("254")).then_some(normalized)
}

/// Like `normalize_phone_number`, but reports which field was invalid.
pub fn require_phone_number(field: &str, raw: &str) -> Result<String> {
    normalize_phone_number(raw).ok_or_else(|| {
        Error::Validation(format!(
            "{field} must be a valid phone number in the format 2547XXXXXXXX"
        ))
    })
}

/// Reject values longer than `max` characters.
pub fn check_max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::Validation(format!(
            "{field} must not exceed {max} characters."
        )));
    }
    Ok(())
}

pub fn check_optional_max_len(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    value.map_or(Ok(()), |v| check_max_len(field, v, max))
}

pub fn check_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must be provided")));
    }
    Ok(())
}

pub fn check_positive_amount(field: &str, amount: f64) -> Result<()> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(Error::Validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

/// Shortcodes travel as JSON numbers; the gateway rejects quoted ones.
pub fn short_code_number(field: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{field} must be a numeric shortcode")))
}

/// Current time in East Africa Time.
pub fn now_eat() -> DateTime<FixedOffset> {
    let eat = FixedOffset::east_opt(EAT_OFFSET_SECS).unwrap_or_else(|| unreachable!());
    Utc::now().with_timezone(&eat)
}

/// `YYYYMMDDHHmmss`
pub fn timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// STK password: `base64(shortcode + passkey + timestamp)`.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}
