use mkt_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::MobileNetwork;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Could not reach the gateway: {0}")]
    Transport(String),
    #[error("The gateway did not respond in time")]
    Timeout,
    #[error("The gateway rejected the request: {0}")]
    Rejected(String),
    #[error("The gateway sent a response that could not be understood: {0}")]
    InvalidResponse(String),
    #[error("Could not authenticate with the gateway: {0}")]
    Authentication(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Correlation reference. The gateway echoes it back in the settlement callback.
    pub reference: String,
    pub msisdn: String,
    pub network: MobileNetwork,
    pub amount: Money,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeAccepted {
    pub gateway_reference: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRequest {
    pub reference: String,
    pub seller_id: i64,
    pub msisdn: String,
    pub network: MobileNetwork,
    pub amount: Money,
    pub narration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementReceipt {
    pub transaction_id: String,
    pub message: Option<String>,
}

/// An external mobile-money collection API.
///
/// Implementations make a single attempt per call, and must resolve timeouts to [`GatewayError::Timeout`] rather than
/// hanging.
#[allow(async_fn_in_trait)]
pub trait ChargeGateway: Clone {
    /// Ask the provider to prompt the customer's handset for payment. An `Ok` result means the charge was accepted for
    /// processing; settlement arrives later through the callback.
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeAccepted, GatewayError>;
}

/// An external mobile-money disbursement API.
#[allow(async_fn_in_trait)]
pub trait PayoutGateway: Clone {
    /// Transfer funds to a seller's wallet. An `Ok` result means the transfer completed.
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementReceipt, GatewayError>;
}
