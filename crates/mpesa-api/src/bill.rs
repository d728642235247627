//! Bill manager onboarding and invoicing
//!
//! A shortcode opts in once, then sends invoices that customers pay against
//! its paybill. Every bill manager response signals success with
//! `rescode` `"200"`.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::normalize::{Normalized, ResultCode};
use crate::validation::{check_not_blank, require_phone_number};

pub const BILL_OPT_IN_PATH: &str = "/v1/billmanager-invoice/optin";
pub const BILL_UPDATE_OPT_IN_PATH: &str = "/v1/billmanager-invoice/change-optin-details";
pub const BILL_SINGLE_INVOICE_PATH: &str = "/v1/billmanager-invoice/single-invoicing";
pub const BILL_BULK_INVOICE_PATH: &str = "/v1/billmanager-invoice/bulk-invoicing";
pub const BILL_CANCEL_SINGLE_INVOICE_PATH: &str = "/v1/billmanager-invoice/cancel-single-invoice";
pub const BILL_CANCEL_BULK_INVOICE_PATH: &str = "/v1/billmanager-invoice/cancel-bulk-invoice";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInRequest {
    pub shortcode: String,
    pub email: String,
    pub official_contact: String,
    /// 1 to enable SMS reminders, 0 to disable
    pub send_reminders: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "callbackurl")]
    pub callback_url: String,
}

impl OptInRequest {
    pub fn validate(mut self) -> Result<Self> {
        check_not_blank("shortcode", &self.shortcode)?;
        if !self.email.contains('@') {
            return Err(Error::Validation("email must be a valid email address".into()));
        }
        if self.send_reminders > 1 {
            return Err(Error::Validation("sendReminders must be 0 or 1".into()));
        }
        self.official_contact = require_phone_number("officialContact", &self.official_contact)?;
        check_not_blank("callbackurl", &self.callback_url)?;
        Ok(self)
    }
}

/// Answer to both opt-in and opt-in updates; only opt-in carries `app_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptInResponse {
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default)]
    pub resmsg: String,
    pub rescode: Option<ResultCode>,
}

impl Normalized for OptInResponse {
    const SUCCESS_CODE: i64 = 200;

    fn result_code(&self) -> Option<&ResultCode> {
        self.rescode.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub item_name: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    /// Merchant's unique invoice number
    pub external_reference: String,
    pub billed_full_name: String,
    pub billed_phone_number: String,
    /// `"<Month> <YYYY>"`, e.g. `"August 2021"`
    pub billed_period: String,
    pub invoice_name: String,
    /// `YYYY-MM-DD`, optionally with a time; normalized on send
    pub due_date: String,
    pub account_reference: String,
    pub amount: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invoice_items: Vec<InvoiceItem>,
}

impl InvoiceRequest {
    pub fn validate(mut self) -> Result<Self> {
        check_not_blank("externalReference", &self.external_reference)?;
        check_not_blank("billedFullName", &self.billed_full_name)?;
        require_phone_number("billedPhoneNumber", &self.billed_phone_number)?;
        check_billed_period(&self.billed_period)?;
        check_not_blank("invoiceName", &self.invoice_name)?;
        self.due_date = normalize_due_date(&self.due_date)?;
        check_not_blank("accountReference", &self.account_reference)?;
        if self.amount == 0 {
            return Err(Error::Validation("amount must be greater than 0".into()));
        }
        if self.invoice_items.iter().any(|item| item.item_name.trim().is_empty()) {
            return Err(Error::Validation("invoiceItems must all have an itemName".into()));
        }
        Ok(self)
    }
}

fn check_billed_period(period: &str) -> Result<()> {
    NaiveDate::parse_from_str(&format!("1 {}", period.trim()), "%d %B %Y")
        .map(|_| ())
        .map_err(|_| {
            Error::Validation("billedPeriod must be a month and year, e.g. August 2021".into())
        })
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// `YYYY-MM-DD` for dates, `YYYY-MM-DD HH:MM:SS.cc` when a time is given.
fn normalize_due_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|at| {
            format!(
                "{}.{:02}",
                at.format("%Y-%m-%d %H:%M:%S"),
                at.nanosecond() / 10_000_000
            )
        })
        .ok_or_else(|| {
            Error::Validation(format!(
                "dueDate must be YYYY-MM-DD, optionally followed by a time; got {raw:?}"
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInvoiceRequest {
    pub external_reference: String,
}

/// Answer to invoicing and cancellation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    #[serde(rename = "Status_Message", default)]
    pub status_message: String,
    #[serde(default)]
    pub resmsg: String,
    pub rescode: Option<ResultCode>,
    /// Per-invoice failures of a bulk call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl Normalized for InvoiceResponse {
    const SUCCESS_CODE: i64 = 200;

    fn result_code(&self) -> Option<&ResultCode> {
        self.rescode.as_ref()
    }
}

#[derive(Clone)]
pub struct BillService {
    gateway: Gateway,
}

impl BillService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Enrol a shortcode in bill manager. The returned `app_key` authorizes
    /// subsequent invoicing calls.
    pub async fn opt_in(&self, request: OptInRequest) -> Result<OptInResponse> {
        let request = request.validate()?;
        self.gateway
            .post("bill_opt_in", BILL_OPT_IN_PATH, &request)
            .await
    }

    /// Change the contact, reminder or callback details of an enrolment.
    pub async fn update_opt_in(&self, request: OptInRequest) -> Result<OptInResponse> {
        let request = request.validate()?;
        self.gateway
            .post("bill_update_opt_in", BILL_UPDATE_OPT_IN_PATH, &request)
            .await
    }

    pub async fn send_invoice(&self, invoice: InvoiceRequest) -> Result<InvoiceResponse> {
        let invoice = invoice.validate()?;
        self.gateway
            .post("bill_single_invoice", BILL_SINGLE_INVOICE_PATH, &invoice)
            .await
    }

    /// Send several invoices in one call; the body is a JSON array.
    pub async fn send_invoices(&self, invoices: Vec<InvoiceRequest>) -> Result<InvoiceResponse> {
        if invoices.is_empty() {
            return Err(Error::Validation("at least one invoice is required".into()));
        }
        let invoices = invoices
            .into_iter()
            .map(InvoiceRequest::validate)
            .collect::<Result<Vec<_>>>()?;
        self.gateway
            .post("bill_bulk_invoice", BILL_BULK_INVOICE_PATH, &invoices)
            .await
    }

    pub async fn cancel_invoice(&self, external_reference: &str) -> Result<InvoiceResponse> {
        check_not_blank("externalReference", external_reference)?;
        let request = CancelInvoiceRequest {
            external_reference: external_reference.to_owned(),
        };
        self.gateway
            .post("bill_cancel_invoice", BILL_CANCEL_SINGLE_INVOICE_PATH, &request)
            .await
    }

    pub async fn cancel_invoices(&self, external_references: &[&str]) -> Result<InvoiceResponse> {
        if external_references.is_empty() {
            return Err(Error::Validation("at least one externalReference is required".into()));
        }
        let requests = external_references
            .iter()
            .map(|reference| {
                check_not_blank("externalReference", reference).map(|_| CancelInvoiceRequest {
                    external_reference: (*reference).to_owned(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.gateway
            .post("bill_cancel_bulk_invoice", BILL_CANCEL_BULK_INVOICE_PATH, &requests)
            .await
    }
}
