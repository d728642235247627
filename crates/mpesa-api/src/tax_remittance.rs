//! Tax remittance to KRA

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::result::Acknowledgement;
use crate::validation::{REMARKS_MAX, check_max_len, check_not_blank, short_code_number};

pub const TAX_REMITTANCE_PATH: &str = "/mpesa/b2b/v1/remittax";

/// Kenya Revenue Authority collection shortcode
pub const KRA_SHORTCODE: u64 = 572572;

/// `account_reference` is the KRA payment registration number (PRN).
#[derive(Debug, Clone, PartialEq)]
pub struct TaxRemittanceRequest {
    pub initiator: String,
    pub security_credential: String,
    pub amount: u64,
    pub party_a: String,
    /// Defaults to `KRA_SHORTCODE`
    pub party_b: Option<String>,
    pub account_reference: String,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxRemittancePayload {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: &'static str,
    pub sender_identifier_type: &'static str,
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: &'static str,
    pub amount: u64,
    pub party_a: u64,
    pub party_b: u64,
    pub account_reference: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl TaxRemittanceRequest {
    pub fn into_payload(self) -> Result<TaxRemittancePayload> {
        check_not_blank("Initiator", &self.initiator)?;
        check_not_blank("SecurityCredential", &self.security_credential)?;
        if self.amount == 0 {
            return Err(Error::Validation("Amount must be greater than 0".into()));
        }
        let party_a = short_code_number("PartyA", &self.party_a)?;
        let party_b = match self.party_b.as_deref() {
            Some(raw) => short_code_number("PartyB", raw)?,
            None => KRA_SHORTCODE,
        };
        check_not_blank("AccountReference", &self.account_reference)?;
        check_max_len("Remarks", &self.remarks, REMARKS_MAX)?;

        Ok(TaxRemittancePayload {
            initiator: self.initiator,
            security_credential: self.security_credential,
            command_id: "PayTaxToKRA",
            sender_identifier_type: "4",
            receiver_identifier_type: "4",
            amount: self.amount,
            party_a,
            party_b,
            account_reference: self.account_reference,
            remarks: self.remarks,
            queue_timeout_url: self.queue_timeout_url,
            result_url: self.result_url,
        })
    }
}

#[derive(Clone)]
pub struct TaxService {
    gateway: Gateway,
}

impl TaxService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Remit tax from the business's shortcode. The outcome arrives as a
    /// `ResultCallback`.
    pub async fn remit(&self, request: TaxRemittanceRequest) -> Result<Acknowledgement> {
        let payload = request.into_payload()?;
        self.gateway
            .post("tax_remittance", TAX_REMITTANCE_PATH, &payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::gateway;
    use crate::normalize::Normalized;
    use crate::result::ResultCallback;
    use serde_json::json;

    fn request() -> TaxRemittanceRequest {
        TaxRemittanceRequest {
            initiator: "TaxPayer".into(),
            security_credential: "encrypted_credential".into(),
            amount: 239,
            party_a: "888880".into(),
            party_b: None,
            account_reference: "353353".into(),
            remarks: "OK".into(),
            queue_timeout_url: "https://mydomain.com/b2b/remittax/queue/".into(),
            result_url: "https://mydomain.com/b2b/remittax/result/".into(),
        }
    }

    #[tokio::test]
    async fn remittance_defaults_to_kra() {
        let (mock, gateway) = gateway();
        mock.push_response(json!({
            "OriginatorConversationID": "5118-111210482-1",
            "ConversationID": "AG_20230420_2010759fd5662ef6d054",
            "ResponseCode": "0",
            "ResponseDescription": "Accept the service request successfully."
        }));

        let ack = TaxService::new(gateway).remit(request()).await.unwrap();
        assert!(ack.is_successful());
        assert_eq!(ack.originator_conversation_id, "5118-111210482-1");

        let calls = mock.calls();
        assert_eq!(calls[1].path, TAX_REMITTANCE_PATH);
        let body = calls[1].body.clone().unwrap();
        assert_eq!(body["CommandID"], "PayTaxToKRA");
        assert_eq!(body["PartyA"], json!(888880));
        assert_eq!(body["PartyB"], json!(572572));
        assert_eq!(body["AccountReference"], "353353");
    }

    #[tokio::test]
    async fn gateway_error_propagates() {
        let (mock, gateway) = gateway();
        mock.push_error(transport::Error::http(
            500,
            "Internal Server Error",
            json!({"errorMessage": "Internal Server Error"}),
        ));

        let err = TaxService::new(gateway).remit(request()).await.unwrap_err();
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[test]
    fn rejects_missing_prn_and_bad_shortcode() {
        let mut req = request();
        req.account_reference = " ".into();
        assert!(req.into_payload().is_err());

        let mut req = request();
        req.party_b = Some("KRA".into());
        assert!(req.into_payload().is_err());
    }

    #[test]
    fn timeout_callback_is_not_successful() {
        let callback = ResultCallback::from_json(
            br#"{"Result":{"ResultType":1,"ResultCode":1,"ResultDesc":"The service request timed out.","OriginatorConversationID":"8521-4298025-1","ConversationID":"AG_20181005_00004d7ee675c0c7ee0b"}}"#,
        )
        .unwrap();
        assert!(callback.is_timeout());
        assert!(!callback.is_successful());
    }
}
