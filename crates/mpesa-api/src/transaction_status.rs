//! Transaction status query

use serde::Serialize;

use crate::balance::IdentifierType;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::result::Acknowledgement;
use crate::validation::{
    OCCASION_MAX, REMARKS_MAX, check_max_len, check_not_blank, check_optional_max_len,
};

pub const TRANSACTION_STATUS_PATH: &str = "/mpesa/transactionstatus/v1/query";

const DEFAULT_REMARKS: &str = "Status check for transaction";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStatusRequest {
    #[serde(rename = "Initiator")]
    pub initiator: String,
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "IdentifierType")]
    pub identifier_type: IdentifierType,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "Occasion", skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
}

impl TransactionStatusRequest {
    pub fn new(
        initiator: impl Into<String>,
        security_credential: impl Into<String>,
        transaction_id: impl Into<String>,
        party_a: impl Into<String>,
        identifier_type: IdentifierType,
        result_url: impl Into<String>,
        queue_timeout_url: impl Into<String>,
    ) -> Self {
        Self {
            initiator: initiator.into(),
            security_credential: security_credential.into(),
            command_id: "TransactionStatusQuery",
            transaction_id: transaction_id.into(),
            party_a: party_a.into(),
            identifier_type,
            result_url: result_url.into(),
            queue_timeout_url: queue_timeout_url.into(),
            remarks: DEFAULT_REMARKS.into(),
            occasion: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_not_blank("Initiator", &self.initiator)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        check_not_blank("TransactionID", &self.transaction_id)?;
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)?;
        check_optional_max_len("Occasion", self.occasion.as_deref(), OCCASION_MAX)
    }
}

#[derive(Clone)]
pub struct TransactionService {
    gateway: Gateway,
}

impl TransactionService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn query_status(&self, request: TransactionStatusRequest) -> Result<Acknowledgement> {
        request.validate()?;
        self.gateway
            .post("transaction_status", TRANSACTION_STATUS_PATH, &request)
            .await
    }
}
