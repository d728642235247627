//! Business payments between shortcodes
//!
//! Business PayBill moves funds from one business's MMF/working account to
//! a paybill. B2C account top-up loads a B2C shortcode's utility account
//! for disbursement. Both go through the same endpoint and differ only in
//! `CommandID`. Like B2C, the POST is only acknowledged; the outcome
//! arrives as a `ResultCallback`.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::result::{Acknowledgement, CallbackAck};
use crate::validation::{
    ACCOUNT_REFERENCE_MAX, REMARKS_MAX, check_max_len, check_not_blank, require_phone_number,
    short_code_number,
};

pub const B2B_PAYMENT_PATH: &str = "/mpesa/b2b/v1/paymentrequest";

/// Shortcode identifier type for both parties
const SHORTCODE_IDENTIFIER: &str = "4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B2bCommand {
    BusinessPayBill,
    /// B2C account top-up
    BusinessPayToBulk,
}

/// Request shared by Business PayBill and B2C account top-up.
/// `security_credential` is the already-encrypted initiator password.
#[derive(Debug, Clone, PartialEq)]
pub struct B2bPaymentRequest {
    pub initiator: String,
    pub security_credential: String,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub account_reference: String,
    /// Customer on whose behalf the business pays, if any
    pub requester: Option<String>,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2bPaymentPayload {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: B2bCommand,
    pub sender_identifier_type: &'static str,
    /// Spelled the way the gateway expects it
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: &'static str,
    pub amount: u64,
    pub party_a: u64,
    pub party_b: u64,
    pub account_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl B2bPaymentRequest {
    pub fn into_payload(self, command_id: B2bCommand) -> Result<B2bPaymentPayload> {
        check_not_blank("Initiator", &self.initiator)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        let party_a = short_code_number("PartyA", &self.party_a)?;
        let party_b = short_code_number("PartyB", &self.party_b)?;
        check_not_blank("AccountReference", &self.account_reference)?;
        check_max_len("AccountReference", &self.account_reference, ACCOUNT_REFERENCE_MAX)?;
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)?;
        check_not_blank("QueueTimeOutURL", &self.queue_timeout_url)?;
        check_not_blank("ResultURL", &self.result_url)?;
        let requester = self
            .requester
            .as_deref()
            .map(|raw| require_phone_number("Requester", raw))
            .transpose()?;

        Ok(B2bPaymentPayload {
            initiator: self.initiator,
            security_credential: self.security_credential,
            command_id,
            sender_identifier_type: SHORTCODE_IDENTIFIER,
            receiver_identifier_type: SHORTCODE_IDENTIFIER,
            amount: self.amount,
            party_a,
            party_b,
            account_reference: self.account_reference,
            requester,
            remarks: self.remarks,
            queue_timeout_url: self.queue_timeout_url,
            result_url: self.result_url,
        })
    }
}

#[derive(Clone)]
pub struct B2bPaymentService {
    gateway: Gateway,
}

impl B2bPaymentService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Pay a paybill from the business's own shortcode.
    pub async fn paybill(&self, request: B2bPaymentRequest) -> Result<Acknowledgement> {
        let payload = request.into_payload(B2bCommand::BusinessPayBill)?;
        self.gateway
            .post("business_paybill", B2B_PAYMENT_PATH, &payload)
            .await
    }

    /// Load a B2C shortcode's utility account.
    pub async fn top_up(&self, request: B2bPaymentRequest) -> Result<Acknowledgement> {
        let payload = request.into_payload(B2bCommand::BusinessPayToBulk)?;
        self.gateway
            .post("b2c_account_top_up", B2B_PAYMENT_PATH, &payload)
            .await
    }

    pub fn acknowledge_result() -> CallbackAck {
        CallbackAck::accepted("Callback received successfully.")
    }

    pub fn acknowledge_timeout() -> CallbackAck {
        CallbackAck::accepted("Timeout notification received and processed.")
    }
}
