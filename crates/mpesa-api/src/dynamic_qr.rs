//! Dynamic QR code generation

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::normalize::{Normalized, ResultCode};
use crate::validation::{check_not_blank, check_positive_amount};

pub const DYNAMIC_QR_PATH: &str = "/mpesa/qrcode/v1/generate";

/// Transaction the QR code initiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QrTransactionType {
    /// Buy goods
    #[serde(rename = "BG")]
    BuyGoods,
    /// Withdraw cash at an agent
    #[serde(rename = "WA")]
    WithdrawCash,
    /// Paybill
    #[serde(rename = "PB")]
    PayBill,
    /// Send money to a phone number
    #[serde(rename = "SM")]
    SendMoney,
    /// Send to a business
    #[serde(rename = "SB")]
    SendToBusiness,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicQrRequest {
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    #[serde(rename = "RefNo")]
    pub ref_no: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "TrxCode")]
    pub trx_code: QrTransactionType,
    /// Credit party identifier: till, paybill, agent or phone number
    #[serde(rename = "CPI")]
    pub cpi: String,
    /// Image edge in pixels
    #[serde(rename = "Size")]
    pub size: String,
}

impl DynamicQrRequest {
    pub fn validate(&self) -> Result<()> {
        check_not_blank("MerchantName", &self.merchant_name)?;
        check_not_blank("RefNo", &self.ref_no)?;
        check_not_blank("CPI", &self.cpi)?;
        check_positive_amount("Amount", self.amount)
    }
}

/// `ResponseCode` comes back as `"00"`, which normalizes to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicQrResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<ResultCode>,
    #[serde(rename = "RequestID", default)]
    pub request_id: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    /// Base64 PNG
    #[serde(rename = "QRCode", default)]
    pub qr_code: Option<String>,
}

impl Normalized for DynamicQrResponse {
    fn result_code(&self) -> Option<&ResultCode> {
        self.response_code.as_ref()
    }
}

#[derive(Clone)]
pub struct DynamicQrService {
    gateway: Gateway,
}

impl DynamicQrService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn generate(&self, request: DynamicQrRequest) -> Result<DynamicQrResponse> {
        request.validate()?;
        self.gateway
            .post("dynamic_qr", DYNAMIC_QR_PATH, &request)
            .await
    }
}
