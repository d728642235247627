//! Unified entry point over every facade

use std::sync::Arc;

use common::ClientConfig;
use mpesa_auth::Authenticator;
use transport::{HttpClient, ReqwestHttpClient};

use crate::b2b::B2bService;
use crate::b2b_payment::B2bPaymentService;
use crate::b2c::B2cService;
use crate::balance::BalanceService;
use crate::bill::BillService;
use crate::c2b::C2bService;
use crate::dynamic_qr::DynamicQrService;
use crate::express::ExpressService;
use crate::gateway::Gateway;
use crate::ratiba::RatibaService;
use crate::reversal::ReversalService;
use crate::tax_remittance::TaxService;
use crate::transaction_status::TransactionService;

/// One transport and one token cache shared by all facades.
///
/// Cloning is cheap; clones share the cached token.
#[derive(Clone)]
pub struct MpesaClient {
    pub express: ExpressService,
    pub b2c: B2cService,
    pub b2b: B2bService,
    pub b2b_payment: B2bPaymentService,
    pub balance: BalanceService,
    pub reversal: ReversalService,
    pub transactions: TransactionService,
    pub c2b: C2bService,
    pub dynamic_qr: DynamicQrService,
    pub bill: BillService,
    pub ratiba: RatibaService,
    pub tax: TaxService,
    gateway: Gateway,
}

impl MpesaClient {
    pub fn new(http: Arc<dyn HttpClient>, auth: Arc<Authenticator>) -> Self {
        let gateway = Gateway::new(http, auth);
        Self {
            express: ExpressService::new(gateway.clone()),
            b2c: B2cService::new(gateway.clone()),
            b2b: B2bService::new(gateway.clone()),
            b2b_payment: B2bPaymentService::new(gateway.clone()),
            balance: BalanceService::new(gateway.clone()),
            reversal: ReversalService::new(gateway.clone()),
            transactions: TransactionService::new(gateway.clone()),
            c2b: C2bService::new(gateway.clone()),
            dynamic_qr: DynamicQrService::new(gateway.clone()),
            bill: BillService::new(gateway.clone()),
            ratiba: RatibaService::new(gateway.clone()),
            tax: TaxService::new(gateway.clone()),
            gateway,
        }
    }

    /// Build a reqwest-backed client from a loaded config.
    ///
    /// The config's consumer credentials must already be resolved
    /// (`ClientConfig::load` does this).
    pub fn from_config(config: &ClientConfig) -> common::Result<Self> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::from_config(config));
        let auth = Arc::new(Authenticator::from_config(config, http.clone())?);
        Ok(Self::new(http, auth))
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        self.gateway.authenticator()
    }
}
