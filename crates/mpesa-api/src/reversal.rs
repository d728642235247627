//! Transaction reversal

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::result::Acknowledgement;
use crate::validation::{
    OCCASION_MAX, REMARKS_MAX, check_max_len, check_not_blank, check_optional_max_len,
};

pub const REVERSAL_PATH: &str = "/mpesa/reversal/v1/request";

/// Receiver identifier type the gateway requires for reversals (organization)
const REVERSAL_RECEIVER_IDENTIFIER: &str = "11";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReversalRequest {
    #[serde(rename = "Initiator")]
    pub initiator: String,
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "Amount")]
    pub amount: u64,
    #[serde(rename = "ReceiverParty")]
    pub receiver_party: String,
    /// Spelled the way the gateway expects it
    #[serde(rename = "RecieverIdentifierType")]
    receiver_identifier_type: &'static str,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "Occasion", skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
}

impl ReversalRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initiator: impl Into<String>,
        security_credential: impl Into<String>,
        transaction_id: impl Into<String>,
        amount: u64,
        receiver_party: impl Into<String>,
        result_url: impl Into<String>,
        queue_timeout_url: impl Into<String>,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            initiator: initiator.into(),
            security_credential: security_credential.into(),
            command_id: "TransactionReversal",
            transaction_id: transaction_id.into(),
            amount,
            receiver_party: receiver_party.into(),
            receiver_identifier_type: REVERSAL_RECEIVER_IDENTIFIER,
            result_url: result_url.into(),
            queue_timeout_url: queue_timeout_url.into(),
            remarks: remarks.into(),
            occasion: None,
        }
    }

    pub fn with_occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn receiver_identifier_type(&self) -> &str {
        self.receiver_identifier_type
    }

    pub fn validate(&self) -> Result<()> {
        check_not_blank("Initiator", &self.initiator)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        check_not_blank("TransactionID", &self.transaction_id)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)?;
        check_optional_max_len("Occasion", self.occasion.as_deref(), OCCASION_MAX)
    }
}

#[derive(Clone)]
pub struct ReversalService {
    gateway: Gateway,
}

impl ReversalService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Request a reversal. The outcome arrives as a `ResultCallback`; the
    /// gateway reports processed reversals with `ResultCode` 21, which is
    /// kept verbatim in the callback rather than treated as success.
    pub async fn reverse(&self, request: ReversalRequest) -> Result<Acknowledgement> {
        request.validate()?;
        self.gateway.post("reversal", REVERSAL_PATH, &request).await
    }
}
