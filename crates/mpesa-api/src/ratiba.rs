//! M-Pesa Ratiba standing orders
//!
//! A standing order asks the customer (`PartyA`) to approve a recurring
//! payment to a paybill or till. Creation is answered with a header whose
//! `responseCode` is `"200"`; each approval or failure is later POSTed to
//! `CallBackURL` as a `StandingOrderCallback` with `responseCode` `"0"` on
//! success.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::metadata::value_as_string;
use crate::normalize::{Normalized, ResultCode};
use crate::result::CallbackAck;
use crate::validation::{
    ACCOUNT_REFERENCE_MAX, TRANSACTION_DESC_MAX, check_max_len, check_not_blank,
    require_phone_number, short_code_number,
};

pub const STANDING_ORDER_PATH: &str = "/standingorder/v1/createStandingOrderExternal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandingOrderType {
    #[serde(rename = "Standing Order Customer Pay Bill")]
    PayBill,
    #[serde(rename = "Standing Order Customer Pay Marchant")]
    BuyGoods,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverIdentifierType {
    #[serde(rename = "2")]
    Till,
    #[serde(rename = "4")]
    PayBill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "1")]
    OneOff,
    #[serde(rename = "2")]
    Daily,
    #[serde(rename = "3")]
    Weekly,
    #[serde(rename = "4")]
    Monthly,
    #[serde(rename = "5")]
    BiMonthly,
    #[serde(rename = "6")]
    Quarterly,
    #[serde(rename = "7")]
    HalfYearly,
    #[serde(rename = "8")]
    Yearly,
}

/// Dates accept `yyyymmdd` or the same with `-`, `/` or `.` separators.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingOrderRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub business_short_code: String,
    pub transaction_type: StandingOrderType,
    pub receiver_identifier_type: ReceiverIdentifierType,
    pub amount: u64,
    pub party_a: String,
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StandingOrderPayload {
    pub standing_order_name: String,
    pub start_date: String,
    pub end_date: String,
    pub business_short_code: String,
    pub transaction_type: StandingOrderType,
    pub receiver_party_identifier_type: ReceiverIdentifierType,
    pub amount: String,
    pub party_a: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
    pub frequency: Frequency,
}

impl StandingOrderRequest {
    pub fn into_payload(self) -> Result<StandingOrderPayload> {
        check_not_blank("StandingOrderName", &self.name)?;
        let start = compact_date("StartDate", &self.start_date)?;
        let end = compact_date("EndDate", &self.end_date)?;
        if end < start {
            return Err(Error::Validation("EndDate must not be before StartDate".into()));
        }
        short_code_number("BusinessShortCode", &self.business_short_code)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        let party_a = require_phone_number("PartyA", &self.party_a)?;
        check_not_blank("CallBackURL", &self.callback_url)?;
        check_max_len("AccountReference", &self.account_reference, ACCOUNT_REFERENCE_MAX)?;
        check_max_len("TransactionDesc", &self.transaction_desc, TRANSACTION_DESC_MAX)?;

        Ok(StandingOrderPayload {
            standing_order_name: self.name,
            start_date: start.format("%Y%m%d").to_string(),
            end_date: end.format("%Y%m%d").to_string(),
            business_short_code: self.business_short_code.trim().to_owned(),
            transaction_type: self.transaction_type,
            receiver_party_identifier_type: self.receiver_identifier_type,
            amount: self.amount.to_string(),
            party_a,
            callback_url: self.callback_url,
            account_reference: self.account_reference,
            transaction_desc: self.transaction_desc,
            frequency: self.frequency,
        })
    }
}

fn compact_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '.'))
        .collect();
    if digits.len() != 8 {
        return Err(date_error(field));
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").map_err(|_| date_error(field))
}

fn date_error(field: &str) -> Error {
    Error::Validation(format!("{field}: Date must be in 'yyyymmdd' format"))
}

/// `responseRefID`/`requestRefID` header carried by both the creation
/// response and the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingOrderHeader {
    #[serde(rename = "responseRefID", default)]
    pub response_ref_id: String,
    #[serde(rename = "requestRefID", default, skip_serializing_if = "Option::is_none")]
    pub request_ref_id: Option<String>,
    #[serde(rename = "responseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "responseDescription", default)]
    pub response_description: String,
    #[serde(rename = "ResultDesc", default, skip_serializing_if = "Option::is_none")]
    pub result_desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingOrderResponse {
    #[serde(rename = "ResponseHeader")]
    pub response_header: StandingOrderHeader,
    #[serde(rename = "ResponseBody", default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

impl Normalized for StandingOrderResponse {
    const SUCCESS_CODE: i64 = 200;

    fn result_code(&self) -> Option<&ResultCode> {
        self.response_header.response_code.as_ref()
    }
}

/// One `{"Name": ..., "Value": ...}` entry of a callback's `ResponseData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingOrderCallbackBody {
    #[serde(rename = "ResponseData", default)]
    pub response_data: Vec<ResponseDataItem>,
}

/// Body POSTed to the standing order's `CallBackURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingOrderCallback {
    #[serde(rename = "ResponseHeader")]
    pub response_header: StandingOrderHeader,
    #[serde(rename = "ResponseBody", default)]
    pub response_body: StandingOrderCallbackBody,
}

impl StandingOrderCallback {
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// String view of the `ResponseData` entry named `name`.
    pub fn data(&self, name: &str) -> Option<String> {
        self.response_body
            .response_data
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| value_as_string(&item.value))
    }

    pub fn acknowledge() -> CallbackAck {
        CallbackAck {
            result_code: ResultCode::Text("0".into()),
            result_desc: "The service request is processed successfully.".into(),
        }
    }
}

impl Normalized for StandingOrderCallback {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_header.response_code.as_ref()
    }
}

#[derive(Clone)]
pub struct RatibaService {
    gateway: Gateway,
}

impl RatibaService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn create_standing_order(
        &self,
        request: StandingOrderRequest,
    ) -> Result<StandingOrderResponse> {
        let payload = request.into_payload()?;
        self.gateway
            .post("ratiba_standing_order", STANDING_ORDER_PATH, &payload)
            .await
    }
}
