//! Bridges the mobile-money aggregator client into the settlement engine's gateway traits.
use log::*;
use momo_tools::{
    helpers::momo_amount,
    CallbackPayload,
    CollectionRequest,
    DisbursementRequest as MomoDisbursement,
    MomoApi,
    MomoApiError,
    TransactionResponse,
    TransactionState,
};
use settlement_engine::{
    objects::{CallbackNotification, CallbackStatus},
    traits::{
        ChargeAccepted,
        ChargeGateway,
        ChargeRequest,
        DisbursementReceipt,
        DisbursementRequest,
        GatewayError,
        PayoutGateway,
    },
};

#[derive(Debug, Clone)]
pub struct MomoChargeGateway {
    api: MomoApi,
}

impl MomoChargeGateway {
    pub fn new(api: MomoApi) -> Self {
        Self { api }
    }
}

impl ChargeGateway for MomoChargeGateway {
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeAccepted, GatewayError> {
        let config = self.api.config();
        let collection = CollectionRequest {
            reference: request.reference,
            msisdn: request.msisdn,
            network: request.network.to_string(),
            amount: momo_amount(request.amount),
            currency: config.currency.clone(),
            account: config.account.clone(),
            narration: request.description,
            callback_url: config.callback_url.clone(),
        };
        let response = self.api.collect(collection).await.map_err(gateway_error)?;
        charge_outcome(response)
    }
}

#[derive(Debug, Clone)]
pub struct MomoPayoutGateway {
    api: MomoApi,
}

impl MomoPayoutGateway {
    pub fn new(api: MomoApi) -> Self {
        Self { api }
    }
}

impl PayoutGateway for MomoPayoutGateway {
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementReceipt, GatewayError> {
        let config = self.api.config();
        let disbursement = MomoDisbursement {
            reference: request.reference,
            msisdn: request.msisdn,
            network: request.network.to_string(),
            amount: momo_amount(request.amount),
            currency: config.currency.clone(),
            account: config.account.clone(),
            narration: request.narration,
        };
        let response = self.api.disburse(disbursement).await.map_err(gateway_error)?;
        disbursement_outcome(response)
    }
}

/// A collection is accepted unless the aggregator declined it outright. Settlement arrives later by callback.
fn charge_outcome(response: TransactionResponse) -> Result<ChargeAccepted, GatewayError> {
    match response.status {
        TransactionState::Failed => {
            Err(GatewayError::Rejected(response.message.unwrap_or_else(|| "The collection was declined".into())))
        },
        TransactionState::Pending | TransactionState::Successful => {
            Ok(ChargeAccepted { gateway_reference: response.transaction_id, message: response.message })
        },
    }
}

/// Disbursements need a transaction id to count as sent. A `pending` answer that carries one has been accepted by
/// the network and is treated as completed.
fn disbursement_outcome(response: TransactionResponse) -> Result<DisbursementReceipt, GatewayError> {
    match (response.status, response.transaction_id) {
        (TransactionState::Failed, _) => {
            Err(GatewayError::Rejected(response.message.unwrap_or_else(|| "The transfer was declined".into())))
        },
        (_, Some(transaction_id)) => Ok(DisbursementReceipt { transaction_id, message: response.message }),
        (status, None) => Err(GatewayError::InvalidResponse(format!(
            "Transfer {} is {status:?} but has no transaction id",
            response.reference
        ))),
    }
}

pub fn gateway_error(e: MomoApiError) -> GatewayError {
    warn!("💳️ Aggregator call failed. {e}");
    match e {
        MomoApiError::Timeout => GatewayError::Timeout,
        MomoApiError::Initialization(s) | MomoApiError::RequestError(s) => GatewayError::Transport(s),
        MomoApiError::Authentication(s) => GatewayError::Authentication(s),
        MomoApiError::QueryError { status, message } if status >= 500 => {
            GatewayError::Transport(format!("{status}. {message}"))
        },
        MomoApiError::QueryError { message, .. } => GatewayError::Rejected(message),
        MomoApiError::ResponseError(s) | MomoApiError::JsonError(s) | MomoApiError::InvalidCurrencyAmount(s) => {
            GatewayError::InvalidResponse(s)
        },
    }
}

/// Converts an aggregator callback into a settlement notification. Returns `None` for interim `pending` callbacks,
/// which carry no settlement.
pub fn callback_notification(payload: CallbackPayload) -> Option<CallbackNotification> {
    let status = match payload.status {
        TransactionState::Successful => CallbackStatus::Successful,
        TransactionState::Failed => CallbackStatus::Failed,
        TransactionState::Pending => return None,
    };
    Some(CallbackNotification { reference: payload.reference, status, message: payload.message })
}
