use std::fmt::Debug;

use log::*;
use mkt_common::Money;

use crate::{
    db_types::{NewPayout, PayoutStatus},
    helpers::new_payout_reference,
    settlement_api::{
        errors::{ReconciliationReport, SettlementError},
        objects::PayoutRequest,
        policy::SettlementPolicy,
    },
    traits::{DisbursementRequest, PayoutGateway, RecordedPayout, SettlementDatabase},
};

/// `PayoutApi` disburses a seller's escrow balance through the payout gateway.
pub struct PayoutApi<B, P> {
    db: B,
    gateway: P,
    policy: SettlementPolicy,
}

impl<B, P> Debug for PayoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi ({:?})", self.policy.withdrawal_policy)
    }
}

impl<B, P> PayoutApi<B, P> {
    pub fn new(db: B, gateway: P, policy: SettlementPolicy) -> Self {
        Self { db, gateway, policy }
    }
}

impl<B, P> PayoutApi<B, P>
where
    B: SettlementDatabase,
    P: PayoutGateway,
{
    /// Withdraws `request.amount` from the escrow balance of the seller linked to `user_id`.
    ///
    /// 1. The balance is checked against the configured [`crate::WithdrawalPolicy`]. No ledger lock is held.
    /// 2. The payout gateway is called once.
    /// 3. A payout row is written whatever the outcome. A completed transfer debits the balance in the same
    ///    transaction, re-checking that the balance still covers the amount.
    ///
    /// A failed transfer is returned as [`SettlementError::GatewayRejected`] with the balance unchanged. Once the
    /// gateway has completed a transfer, any failure to record it is returned as [`SettlementError::Reconciliation`],
    /// whether the balance no longer covers the amount or the ledger write itself fails.
    pub async fn request_payout(
        &self,
        user_id: &str,
        request: PayoutRequest,
    ) -> Result<RecordedPayout, SettlementError> {
        let amount = request.amount;
        if amount < Money::from(1) {
            return Err(SettlementError::invalid_field("amount", "must be at least the smallest currency unit"));
        }
        let seller = self
            .db
            .fetch_seller_for_user(user_id)
            .await?
            .ok_or_else(|| SettlementError::SellerNotFound(user_id.into()))?;
        let balance = self.db.fetch_seller_balance(seller.id).await?;
        let available = balance.as_ref().map(|b| b.balance).unwrap_or_default();
        let balance = match balance {
            Some(b) if self.policy.withdrawal_policy.permits(available, amount) => b,
            _ => {
                debug!("💸️ Seller {} asked for {amount} with {available} available. Rejected", seller.id);
                return Err(SettlementError::InsufficientBalance { available, requested: amount });
            },
        };
        let destination = self
            .policy
            .phone
            .parse(&seller.payout_phone)
            .map_err(|e| SettlementError::invalid_field("payout_phone", e.to_string()))?;
        let reference = new_payout_reference();
        let disbursement = DisbursementRequest {
            reference: reference.clone(),
            seller_id: seller.id,
            msisdn: destination.msisdn().to_string(),
            network: destination.network,
            amount,
            narration: request.note.clone().unwrap_or_else(|| format!("Payout {reference}")),
        };
        debug!("💸️ Disbursing {amount} to seller {} on {} [{reference}]", seller.id, destination.network);
        let outcome = self.gateway.disburse(disbursement).await;
        let mut payout = NewPayout {
            seller_id: seller.id,
            store_id: balance.store_id,
            amount,
            reference,
            transaction_id: None,
            payment_method: seller.payout_method.clone(),
            destination_account: destination.e164.clone(),
            status: PayoutStatus::Completed,
            message: None,
            note: request.note,
        };
        match outcome {
            Ok(receipt) => {
                payout.transaction_id = Some(receipt.transaction_id);
                payout.message = receipt.message;
            },
            Err(e) => {
                payout.status = PayoutStatus::Failed;
                payout.message = Some(e.to_string());
            },
        }
        let completed = payout.status == PayoutStatus::Completed;
        let recorded = match self.db.record_payout(payout.clone()).await {
            Ok(recorded) => recorded,
            Err(SettlementError::Reconciliation(report)) => {
                error!(
                    "💸️ RECONCILIATION REQUIRED. The gateway completed a transfer that the ledger could not debit. \
                     {report}"
                );
                return Err(SettlementError::Reconciliation(report));
            },
            Err(e) if completed => {
                error!("💸️ Could not record completed payout {} for seller {}. {e}", payout.reference, seller.id);
                return Err(self.unrecorded_transfer(payout, available).await);
            },
            Err(e) => {
                error!("💸️ Could not record the payout for seller {} after calling the gateway. {e}", seller.id);
                return Err(e);
            },
        };
        let payout = &recorded.payout;
        if payout.status == PayoutStatus::Failed {
            let message = payout.message.clone().unwrap_or_default();
            warn!("💸️ Payout {} [{}] failed at the gateway: {message}", payout.id, payout.reference);
            return Err(SettlementError::GatewayRejected { record_id: payout.id, message });
        }
        info!(
            "💸️ Payout {} of {} to seller {} completed. Balance {} -> {}",
            payout.id, payout.amount, payout.seller_id, recorded.balance_before, recorded.balance_after
        );
        Ok(recorded)
    }

    /// Builds the reconciliation error for a completed transfer whose ledger write failed. The payout row is written
    /// again on its own so the transfer stays traceable. The balance was not debited.
    async fn unrecorded_transfer(&self, payout: NewPayout, available: Money) -> SettlementError {
        let payout_id = match self.db.record_unreconciled_payout(payout.clone()).await {
            Ok(row) => Some(row.id),
            Err(e) => {
                error!("💸️ Payout {} could not be stored at all. {e}", payout.reference);
                None
            },
        };
        let balance = match self.db.fetch_seller_balance(payout.seller_id).await {
            Ok(Some(b)) => b.balance,
            Ok(None) => Money::default(),
            Err(_) => available,
        };
        let report = ReconciliationReport {
            payout_id,
            payout_reference: payout.reference,
            gateway_transaction_id: payout.transaction_id,
            seller_id: payout.seller_id,
            store_id: payout.store_id,
            amount: payout.amount,
            balance_before: balance,
            balance_after: balance,
        };
        error!("💸️ RECONCILIATION REQUIRED. The gateway completed a transfer that the ledger did not record. {report}");
        SettlementError::Reconciliation(Box::new(report))
    }
}
