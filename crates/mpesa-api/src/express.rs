//! M-Pesa Express (STK push)
//!
//! `push` prompts a customer's handset for their PIN; `query` polls the
//! outcome. The final result is delivered asynchronously as an
//! `StkCallback` to the request's `CallBackURL`.

use common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::metadata::{self, MetadataItem};
use crate::normalize::{Normalized, ResultCode};
use crate::validation::{
    ACCOUNT_REFERENCE_MAX, TRANSACTION_DESC_MAX, check_max_len, check_not_blank,
    now_eat, require_phone_number, short_code_number, stk_password, timestamp,
};

pub const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
pub const STK_QUERY_PATH: &str = "/mpesa/stkpushquery/v1/query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// PayBill numbers; `AccountReference` is required
    CustomerPayBillOnline,
    /// Till numbers
    CustomerBuyGoodsOnline,
}

/// How the request proves it may charge the shortcode.
#[derive(Debug, Clone)]
pub enum StkCredentials {
    /// Password and timestamp derived at send time
    Passkey(Secret<String>),
    /// Caller-computed password with the timestamp it was built from
    Password { password: String, timestamp: String },
}

impl StkCredentials {
    pub fn passkey(passkey: impl Into<String>) -> Self {
        StkCredentials::Passkey(Secret::new(passkey.into()))
    }

    /// Resolve to `(Password, Timestamp)` for `shortcode`.
    fn resolve(&self, shortcode: &str) -> Result<(String, String)> {
        match self {
            StkCredentials::Passkey(passkey) => {
                if passkey.is_blank() {
                    return Err(Error::Validation("Passkey must not be empty".into()));
                }
                let ts = timestamp(&now_eat());
                Ok((stk_password(shortcode, passkey.expose(), &ts), ts))
            }
            StkCredentials::Password {
                password,
                timestamp,
            } => {
                check_not_blank("Password", password)?;
                check_not_blank("Timestamp", timestamp)?;
                Ok((password.clone(), timestamp.clone()))
            }
        }
    }
}

/// STK push request as built by the caller.
#[derive(Debug, Clone)]
pub struct StkPushRequest {
    pub business_short_code: String,
    pub credentials: StkCredentials,
    pub transaction_type: TransactionType,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// Wire body for `STK_PUSH_PATH`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushPayload {
    pub business_short_code: u64,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: TransactionType,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

impl StkPushRequest {
    /// Validate and produce the wire body.
    ///
    /// Phone numbers are normalized to `2547XXXXXXXX`; `PartyA` is only
    /// normalized when it looks like a phone number.
    pub fn into_payload(self) -> Result<StkPushPayload> {
        let business_short_code =
            short_code_number("BusinessShortCode", &self.business_short_code)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        let phone_number = require_phone_number("PhoneNumber", &self.phone_number)?;
        let party_a = crate::validation::normalize_phone_number(&self.party_a)
            .unwrap_or(self.party_a);

        if self.transaction_type == TransactionType::CustomerPayBillOnline {
            check_not_blank("AccountReference", &self.account_reference).map_err(|_| {
                Error::Validation("AccountReference must be provided when using PayBill".into())
            })?;
        }
        check_max_len("AccountReference", &self.account_reference, ACCOUNT_REFERENCE_MAX)?;
        check_max_len("TransactionDesc", &self.transaction_desc, TRANSACTION_DESC_MAX)?;

        let (password, timestamp) = self.credentials.resolve(self.business_short_code.trim())?;

        Ok(StkPushPayload {
            business_short_code,
            password,
            timestamp,
            transaction_type: self.transaction_type,
            amount: self.amount,
            party_a,
            party_b: self.party_b,
            phone_number,
            callback_url: self.callback_url,
            account_reference: self.account_reference,
            transaction_desc: self.transaction_desc,
        })
    }
}

/// Synchronous acknowledgement of an STK push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: String,
}

impl Normalized for StkPushResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_code.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct StkQueryRequest {
    pub business_short_code: String,
    pub credentials: StkCredentials,
    pub checkout_request_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StkQueryPayload {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: u64,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
}

impl StkQueryRequest {
    pub fn into_payload(self) -> Result<StkQueryPayload> {
        let business_short_code =
            short_code_number("BusinessShortCode", &self.business_short_code)?;
        check_not_blank("CheckoutRequestID", &self.checkout_request_id)?;
        let (password, timestamp) = self.credentials.resolve(self.business_short_code.trim())?;
        Ok(StkQueryPayload {
            business_short_code,
            password,
            timestamp,
            checkout_request_id: self.checkout_request_id,
        })
    }
}

/// STK query result. `is_successful` reflects the query itself
/// (`ResponseCode`); `payment_completed` reflects the payment (`ResultCode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkQueryResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: Option<ResultCode>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
}

impl StkQueryResponse {
    pub fn payment_completed(&self) -> bool {
        self.result_code.as_ref().is_some_and(|code| code.matches(0))
    }
}

impl Normalized for StkQueryResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_code.as_ref()
    }
}

/// Body POSTed by the gateway to the STK `CallBackURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallbackResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallbackResult {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: Option<ResultCode>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default, skip_serializing_if = "Option::is_none")]
    pub callback_metadata: Option<CallbackMetadata>,
}

/// `Item` is normally a list but single-item callbacks sometimes carry a
/// bare object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default, deserialize_with = "one_or_many")]
    pub item: Vec<MetadataItem>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<MetadataItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<MetadataItem>),
        One(MetadataItem),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

impl StkCallback {
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    pub fn result(&self) -> &StkCallbackResult {
        &self.body.stk_callback
    }

    /// Raw metadata value by item name.
    pub fn metadata_value(&self, name: &str) -> Option<&Value> {
        self.result()
            .callback_metadata
            .as_ref()
            .and_then(|metadata| metadata::find(&metadata.item, name))
    }

    pub fn amount(&self) -> Option<f64> {
        self.metadata_value("Amount").and_then(metadata::value_as_f64)
    }

    pub fn mpesa_receipt_number(&self) -> Option<String> {
        self.metadata_value("MpesaReceiptNumber")
            .and_then(metadata::value_as_string)
    }

    pub fn balance(&self) -> Option<f64> {
        self.metadata_value("Balance").and_then(metadata::value_as_f64)
    }

    pub fn transaction_date(&self) -> Option<String> {
        self.metadata_value("TransactionDate")
            .and_then(metadata::value_as_string)
    }

    pub fn phone_number(&self) -> Option<String> {
        self.metadata_value("PhoneNumber")
            .and_then(metadata::value_as_string)
    }
}

impl Normalized for StkCallback {
    fn result_code(&self) -> Option<&ResultCode> {
        self.body.stk_callback.result_code.as_ref()
    }
}

/// STK push facade.
#[derive(Clone)]
pub struct ExpressService {
    gateway: Gateway,
}

impl ExpressService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Initiate an STK push.
    pub async fn push(&self, request: StkPushRequest) -> Result<StkPushResponse> {
        let payload = request.into_payload()?;
        self.gateway.post("stk_push", STK_PUSH_PATH, &payload).await
    }

    /// Query the status of an earlier push by `CheckoutRequestID`.
    pub async fn query(&self, request: StkQueryRequest) -> Result<StkQueryResponse> {
        let payload = request.into_payload()?;
        self.gateway.post("stk_query", STK_QUERY_PATH, &payload).await
    }
}
