//! Business to customer payments

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::result::Acknowledgement;
use crate::validation::{
    OCCASION_MAX, REMARKS_MAX, check_max_len, check_not_blank, check_optional_max_len,
    require_phone_number,
};

pub const B2C_PATH: &str = "/mpesa/b2c/v3/paymentrequest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B2cCommand {
    BusinessPayment,
    SalaryPayment,
    PromotionPayment,
}

/// B2C payment request. `security_credential` is the already-encrypted
/// initiator password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2cRequest {
    #[serde(rename = "OriginatorConversationID")]
    pub originator_conversation_id: String,
    #[serde(rename = "InitiatorName")]
    pub initiator_name: String,
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: B2cCommand,
    #[serde(rename = "Amount")]
    pub amount: u64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Recipient MSISDN, normalized on send
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    #[serde(rename = "Occasion", skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
}

impl B2cRequest {
    pub fn validate(mut self) -> Result<Self> {
        check_not_blank("OriginatorConversationID", &self.originator_conversation_id)?;
        check_not_blank("InitiatorName", &self.initiator_name)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        self.party_b = require_phone_number("PartyB", &self.party_b)?;
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)?;
        check_optional_max_len("Occasion", self.occasion.as_deref(), OCCASION_MAX)?;
        Ok(self)
    }
}

#[derive(Clone)]
pub struct B2cService {
    gateway: Gateway,
}

impl B2cService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Send money to a customer. The returned acknowledgement only confirms
    /// acceptance; the outcome arrives as a `ResultCallback`.
    pub async fn send_payment(&self, request: B2cRequest) -> Result<Acknowledgement> {
        let request = request.validate()?;
        self.gateway.post("b2c_payment", B2C_PATH, &request).await
    }
}
