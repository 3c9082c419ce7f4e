use std::fmt::Debug;

use log::*;
use mkt_common::FeeRate;

use crate::{
    settlement_api::{
        errors::SettlementError,
        objects::{CallbackNotification, CallbackOutcome, CallbackStatus},
    },
    traits::SettlementDatabase,
};

const DEFAULT_FAILURE_REASON: &str = "The gateway reported the charge as failed";

/// `CallbackApi` applies charge settlement notifications from the gateway to the ledger.
///
/// Notifications are untrusted and may arrive more than once. Only the first notification for a `pending` payment has
/// any effect. Later ones are rejected with [`SettlementError::PaymentAlreadyProcessed`] and change nothing.
pub struct CallbackApi<B> {
    db: B,
    fee_rate: FeeRate,
}

impl<B> Debug for CallbackApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CallbackApi (fee rate {})", self.fee_rate)
    }
}

impl<B> CallbackApi<B> {
    pub fn new(db: B, fee_rate: FeeRate) -> Self {
        Self { db, fee_rate }
    }
}

impl<B> CallbackApi<B>
where B: SettlementDatabase
{
    pub async fn process_callback(
        &self,
        notification: CallbackNotification,
    ) -> Result<CallbackOutcome, SettlementError> {
        let reference = notification.reference.trim();
        if reference.is_empty() {
            return Err(SettlementError::invalid_field("reference", "is required"));
        }
        match notification.status {
            CallbackStatus::Successful => {
                let settled = self.db.settle_payment(reference, self.fee_rate).await.map_err(|e| {
                    log_rejection(reference, &e);
                    e
                })?;
                info!(
                    "🔔️ Payment {reference} settled. Order {} is paid; {} escrows created, platform fee {}",
                    settled.order.id,
                    settled.escrows.len(),
                    settled.total_platform_fee()
                );
                Ok(CallbackOutcome::Settled(settled))
            },
            CallbackStatus::Failed => {
                let reason = notification.message.as_deref().unwrap_or(DEFAULT_FAILURE_REASON);
                let payment = self.db.fail_payment(reference, reason).await.map_err(|e| {
                    log_rejection(reference, &e);
                    e
                })?;
                info!("🔔️ Payment {reference} for order {} failed at the gateway: {reason}", payment.order_id);
                Ok(CallbackOutcome::Failed(payment))
            },
        }
    }
}

fn log_rejection(reference: &str, e: &SettlementError) {
    match e {
        SettlementError::PaymentAlreadyProcessed { .. } => {
            info!("🔔️ Duplicate callback for {reference} ignored. {e}")
        },
        SettlementError::PaymentNotFound(_) => warn!("🔔️ Callback for unknown reference {reference}"),
        _ => error!("🔔️ Callback for {reference} could not be applied and was rolled back. {e}"),
    }
}
