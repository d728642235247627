//! Customer to business: URL registration and validation/confirmation
//!
//! After `register_url`, the gateway POSTs every incoming payment to the
//! validation URL (when external validation is enabled for the shortcode)
//! and then to the confirmation URL. Both carry a `C2bPaymentNotification`;
//! the merchant answers with a `C2bValidationResponse` or a plain
//! acknowledgement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::normalize::{Normalized, ResultCode};
use crate::result::CallbackAck;
use crate::validation::{C2B_RESULT_DESC_MAX, check_max_len, check_not_blank};

pub const C2B_REGISTER_URL_PATH: &str = "/mpesa/c2b/v2/registerurl";

/// What the gateway does when the validation URL is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterUrlRequest {
    #[serde(rename = "ShortCode")]
    pub short_code: String,
    #[serde(rename = "ResponseType")]
    pub response_type: ResponseType,
    #[serde(rename = "ConfirmationURL")]
    pub confirmation_url: String,
    #[serde(rename = "ValidationURL")]
    pub validation_url: String,
}

impl RegisterUrlRequest {
    pub fn validate(&self) -> Result<()> {
        check_not_blank("ShortCode", &self.short_code)?;
        check_not_blank("ConfirmationURL", &self.confirmation_url)?;
        check_not_blank("ValidationURL", &self.validation_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUrlResponse {
    #[serde(rename = "OriginatorConversationID", default)]
    pub originator_conversation_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
}

impl Normalized for RegisterUrlResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_code.as_ref()
    }
}

/// The register-URL endpoint misspells `OriginatorCoversationID`.
fn fix_originator_typo(mut body: Value) -> Value {
    if let Some(map) = body.as_object_mut() {
        if let Some(value) = map.remove("OriginatorCoversationID") {
            map.entry("OriginatorConversationID").or_insert(value);
        }
    }
    body
}

/// Payment notification sent to the validation and confirmation URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C2bPaymentNotification {
    #[serde(rename = "TransactionType", default)]
    pub transaction_type: String,
    #[serde(rename = "TransID", default)]
    pub trans_id: String,
    #[serde(rename = "TransTime", default)]
    pub trans_time: String,
    #[serde(rename = "TransAmount", default)]
    pub trans_amount: Value,
    #[serde(rename = "BusinessShortCode", default)]
    pub business_short_code: Value,
    #[serde(rename = "BillRefNumber", default)]
    pub bill_ref_number: Option<String>,
    #[serde(rename = "InvoiceNumber", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "OrgAccountBalance", default)]
    pub org_account_balance: Option<Value>,
    #[serde(rename = "ThirdPartyTransID", default)]
    pub third_party_trans_id: Option<String>,
    #[serde(rename = "MSISDN", default)]
    pub msisdn: String,
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "MiddleName", default)]
    pub middle_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
}

impl C2bPaymentNotification {
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// `TransAmount` as a number, whether sent as `"10.00"` or `10`.
    pub fn amount(&self) -> Option<f64> {
        crate::metadata::value_as_f64(&self.trans_amount)
    }
}

/// Codes a merchant may answer a validation request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted,
    InvalidMsisdn,
    InvalidAccountNumber,
    InvalidAmount,
    InvalidKycDetails,
    InvalidShortcode,
    OtherError,
}

impl ValidationResult {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationResult::Accepted => "0",
            ValidationResult::InvalidMsisdn => "C2B00011",
            ValidationResult::InvalidAccountNumber => "C2B00012",
            ValidationResult::InvalidAmount => "C2B00013",
            ValidationResult::InvalidKycDetails => "C2B00014",
            ValidationResult::InvalidShortcode => "C2B00015",
            ValidationResult::OtherError => "C2B00016",
        }
    }
}

/// Merchant's answer to a validation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C2bValidationResponse {
    #[serde(rename = "ResultCode")]
    pub result_code: ResultCode,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "ThirdPartyTransID", default, skip_serializing_if = "Option::is_none")]
    pub third_party_trans_id: Option<String>,
}

impl C2bValidationResponse {
    /// Build the reply to `notification`. `result_desc` is capped at 90
    /// characters by the gateway.
    pub fn new(
        result: ValidationResult,
        result_desc: impl Into<String>,
        notification: &C2bPaymentNotification,
    ) -> Result<Self> {
        let result_desc = result_desc.into();
        check_max_len("ResultDesc", &result_desc, C2B_RESULT_DESC_MAX)?;
        Ok(Self {
            result_code: ResultCode::from(result.code()),
            result_desc,
            third_party_trans_id: notification.third_party_trans_id.clone(),
        })
    }
}

impl Normalized for C2bValidationResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        Some(&self.result_code)
    }
}

/// Reply to a confirmation notification; always success.
pub fn confirmation_ack() -> CallbackAck {
    CallbackAck::accepted("Success")
}

#[derive(Clone)]
pub struct C2bService {
    gateway: Gateway,
}

impl C2bService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Register validation and confirmation URLs for a shortcode.
    pub async fn register_url(&self, request: RegisterUrlRequest) -> Result<RegisterUrlResponse> {
        request.validate()?;
        self.gateway
            .post_with(
                "c2b_register_url",
                C2B_REGISTER_URL_PATH,
                &request,
                fix_originator_typo,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::gateway;
    use serde_json::json;

    #[tokio::test]
    async fn register_url_renames_misspelled_field() {
        let (mock, gateway) = gateway();
        mock.push_response(json!({
            "OriginatorCoversationID": "7619-37765134-1",
            "ResponseCode": "0",
            "ResponseDescription": "success"
        }));

        let response = C2bService::new(gateway)
            .register_url(RegisterUrlRequest {
                short_code: "600999".into(),
                response_type: ResponseType::Completed,
                confirmation_url: "https://example.com/confirmation".into(),
                validation_url: "https://example.com/validation".into(),
            })
            .await
            .unwrap();
        assert!(response.is_successful());
        assert_eq!(response.originator_conversation_id, "7619-37765134-1");

        let body = mock.calls()[1].body.clone().unwrap();
        assert_eq!(body["ResponseType"], "Completed");
        assert_eq!(body["ConfirmationURL"], "https://example.com/confirmation");
    }

    #[test]
    fn correctly_spelled_field_wins() {
        let fixed = fix_originator_typo(json!({
            "OriginatorCoversationID": "typo",
            "OriginatorConversationID": "right"
        }));
        assert_eq!(fixed, json!({"OriginatorConversationID": "right"}));
    }

    fn notification() -> C2bPaymentNotification {
        serde_json::from_value(json!({
            "TransactionType": "Pay Bill",
            "TransID": "RKTQDM7W6S",
            "TransTime": "20191122063845",
            "TransAmount": "10",
            "BusinessShortCode": "600638",
            "BillRefNumber": "invoice008",
            "InvoiceNumber": "",
            "OrgAccountBalance": "",
            "ThirdPartyTransID": "3rd-party-1",
            "MSISDN": "25470****149",
            "FirstName": "John",
            "MiddleName": "",
            "LastName": "Doe"
        }))
        .unwrap()
    }

    #[test]
    fn validation_reply_echoes_third_party_id() {
        let reply = C2bValidationResponse::new(
            ValidationResult::InvalidAccountNumber,
            "Rejected",
            &notification(),
        )
        .unwrap();
        assert!(!reply.is_successful());
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"ResultCode": "C2B00012", "ResultDesc": "Rejected", "ThirdPartyTransID": "3rd-party-1"})
        );

        let accept =
            C2bValidationResponse::new(ValidationResult::Accepted, "Accepted", &notification())
                .unwrap();
        assert!(accept.is_successful());
    }

    #[test]
    fn validation_reply_desc_is_capped() {
        let err = C2bValidationResponse::new(
            ValidationResult::OtherError,
            "x".repeat(91),
            &notification(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("90"));
    }

    #[test]
    fn notification_amount_accepts_strings() {
        assert_eq!(notification().amount(), Some(10.0));
        assert_eq!(
            serde_json::to_value(confirmation_ack()).unwrap()["ResultCode"],
            0
        );
    }
}
