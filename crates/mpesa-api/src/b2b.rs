//! B2B express checkout (USSD push to a till or paybill operator)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::metadata::value_as_f64;
use crate::normalize::{Normalized, ResultCode};
use crate::result::CallbackAck;
use crate::validation::check_not_blank;

pub const B2B_EXPRESS_CHECKOUT_PATH: &str = "/v1/ussdpush/get-msisdn";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct B2bExpressCheckoutRequest {
    pub primary_short_code: String,
    pub receiver_short_code: String,
    pub amount: u64,
    pub payment_ref: String,
    pub callback_url: String,
    pub partner_name: String,
    #[serde(rename = "RequestRefID")]
    pub request_ref_id: String,
}

impl B2bExpressCheckoutRequest {
    pub fn validate(&self) -> Result<()> {
        check_not_blank("primaryShortCode", &self.primary_short_code)?;
        check_not_blank("receiverShortCode", &self.receiver_short_code)?;
        check_not_blank("RequestRefID", &self.request_ref_id)?;
        if self.amount == 0 {
            return Err(Error::Validation("amount must be greater than 0".into()));
        }
        Ok(())
    }
}

/// `{"code": "0", "status": "USSD Initiated Successfully"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bExpressCheckoutResponse {
    pub code: Option<ResultCode>,
    #[serde(default)]
    pub status: String,
}

impl Normalized for B2bExpressCheckoutResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        self.code.as_ref()
    }
}

/// Outcome POSTed to the request's `callbackUrl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2bExpressCheckoutCallback {
    pub result_code: Option<ResultCode>,
    #[serde(default)]
    pub result_desc: String,
    /// Number or numeric string; read through `amount()`
    #[serde(rename = "amount", default)]
    pub raw_amount: Option<Value>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub result_type: Option<ResultCode>,
    #[serde(rename = "conversationID", default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

impl B2bExpressCheckoutCallback {
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    pub fn acknowledge() -> CallbackAck {
        CallbackAck::accepted("Callback received successfully.")
    }

    pub fn amount(&self) -> Option<f64> {
        self.raw_amount.as_ref().and_then(value_as_f64)
    }
}

impl Normalized for B2bExpressCheckoutCallback {
    fn result_code(&self) -> Option<&ResultCode> {
        self.result_code.as_ref()
    }
}

#[derive(Clone)]
pub struct B2bService {
    gateway: Gateway,
}

impl B2bService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Push a USSD payment prompt to the receiving merchant's operator.
    pub async fn express_checkout(
        &self,
        request: B2bExpressCheckoutRequest,
    ) -> Result<B2bExpressCheckoutResponse> {
        request.validate()?;
        self.gateway
            .post("b2b_express_checkout", B2B_EXPRESS_CHECKOUT_PATH, &request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::gateway;
    use serde_json::json;

    fn request() -> B2bExpressCheckoutRequest {
        B2bExpressCheckoutRequest {
            primary_short_code: "123456".into(),
            receiver_short_code: "654321".into(),
            amount: 100,
            payment_ref: "Invoice123".into(),
            callback_url: "http://example.com/result".into(),
            partner_name: "VendorName".into(),
            request_ref_id: "550e8400-e29b-41d4-a716-446655440000".into(),
        }
    }

    #[tokio::test]
    async fn ussd_push_is_acknowledged() {
        let (mock, gateway) = gateway();
        mock.push_response(json!({"code": "0", "status": "USSD Initiated Successfully"}));

        let response = B2bService::new(gateway)
            .express_checkout(request())
            .await
            .unwrap();
        assert!(response.is_successful());
        assert_eq!(response.status, "USSD Initiated Successfully");

        let body = mock.calls()[1].body.clone().unwrap();
        assert_eq!(body["primaryShortCode"], "123456");
        assert_eq!(body["RequestRefID"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(body["callbackUrl"], "http://example.com/result");
    }

    #[test]
    fn callback_with_string_code() {
        let callback: B2bExpressCheckoutCallback = serde_json::from_value(json!({
            "resultCode": "0",
            "resultDesc": "The service request is processed successfully.",
            "amount": 71.0,
            "requestId": "404e1aec-19e0-4ce3-973d-bd92e94c8021",
            "resultType": "0",
            "conversationID": "AG_20230426_2010434680d9f5a73766",
            "transactionId": "RDQ01NFT1Q",
            "status": "SUCCESS"
        }))
        .unwrap();
        assert!(callback.is_successful());
        assert_eq!(callback.transaction_id.as_deref(), Some("RDQ01NFT1Q"));
        assert_eq!(callback.amount(), Some(71.0));
    }

    #[test]
    fn callback_amount_sent_as_string() {
        let callback = B2bExpressCheckoutCallback::from_json(
            br#"{"resultCode":"0","resultDesc":"The service request is processed successfully.","amount":"71.0","requestId":"404e1aec-19e0-4ce3-973d-bd92e94c8021","transactionId":"RDQ01NFT1Q","status":"SUCCESS"}"#,
        )
        .unwrap();
        assert!(callback.is_successful());
        assert_eq!(callback.amount(), Some(71.0));
    }

    #[test]
    fn callback_without_amount() {
        let callback = B2bExpressCheckoutCallback::from_json(
            br#"{"resultCode":"4001","resultDesc":"User cancelled transaction"}"#,
        )
        .unwrap();
        assert_eq!(callback.amount(), None);
    }

    #[test]
    fn cancelled_callback_is_not_successful() {
        let callback: B2bExpressCheckoutCallback = serde_json::from_value(json!({
            "resultCode": "4001",
            "resultDesc": "User cancelled transaction",
            "requestId": "c2a9ba32-9e11-4b90-892c-7bc54944609a",
            "amount": 71.0,
            "paymentReference": "MAndbubry3hi"
        }))
        .unwrap();
        assert!(!callback.is_successful());
        assert_eq!(callback.payment_reference.as_deref(), Some("MAndbubry3hi"));
        assert!(callback.result_desc.contains("cancelled"));
    }

    #[test]
    fn acknowledgement_body() {
        let ack = B2bExpressCheckoutCallback::acknowledge();
        assert!(ack.result_code.matches(0));
        assert!(ack.result_desc.contains("Callback received successfully"));
    }
}
