//! Account balance query

use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::result::Acknowledgement;
use crate::validation::{REMARKS_MAX, check_max_len, check_not_blank};

pub const ACCOUNT_BALANCE_PATH: &str = "/mpesa/accountbalance/v1/query";

/// Type of organization identified by `PartyA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    Msisdn = 1,
    TillNumber = 2,
    ShortCode = 4,
}

impl Serialize for IdentifierType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalanceRequest {
    #[serde(rename = "Initiator")]
    pub initiator: String,
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "IdentifierType")]
    pub identifier_type: IdentifierType,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl AccountBalanceRequest {
    pub fn new(
        initiator: impl Into<String>,
        security_credential: impl Into<String>,
        party_a: impl Into<String>,
        identifier_type: IdentifierType,
        remarks: impl Into<String>,
        queue_timeout_url: impl Into<String>,
        result_url: impl Into<String>,
    ) -> Self {
        Self {
            initiator: initiator.into(),
            security_credential: security_credential.into(),
            command_id: "AccountBalance",
            party_a: party_a.into(),
            identifier_type,
            remarks: remarks.into(),
            queue_timeout_url: queue_timeout_url.into(),
            result_url: result_url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_not_blank("Initiator", &self.initiator)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        check_not_blank("PartyA", &self.party_a)?;
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)
    }
}

#[derive(Clone)]
pub struct BalanceService {
    gateway: Gateway,
}

impl BalanceService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Request the balance; the figures arrive as a `ResultCallback` whose
    /// `AccountBalance` parameter lists each account.
    pub async fn query(&self, request: AccountBalanceRequest) -> Result<Acknowledgement> {
        request.validate()?;
        self.gateway
            .post("account_balance", ACCOUNT_BALANCE_PATH, &request)
            .await
    }
}
