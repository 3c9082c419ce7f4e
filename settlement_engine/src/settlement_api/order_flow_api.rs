use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType},
    settlement_api::errors::SettlementError,
    traits::{SettlementDatabase, StatusChange},
};

/// `OrderFlowApi` handles the manual order status transitions: buyer cancellations and refund requests, and the
/// shipping and delivery updates made by the platform.
///
/// Every change appends an entry to the order's status history in the same transaction. An order can only become
/// `paid` through a settled gateway callback, never through this API.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: SettlementDatabase
{
    /// Cancels an unpaid order belonging to `buyer_id`.
    pub async fn cancel_order(
        &self,
        buyer_id: &str,
        order_id: i64,
        reason: Option<String>,
    ) -> Result<StatusChange, SettlementError> {
        self.buyer_order(buyer_id, order_id).await?;
        let change = self.db.transition_order_status(order_id, OrderStatusType::Cancelled, buyer_id, reason).await?;
        info!("🔄️ Order {order_id} cancelled by {buyer_id}");
        Ok(change)
    }

    /// Flags a paid or delivered order belonging to `buyer_id` for a refund.
    pub async fn request_refund(
        &self,
        buyer_id: &str,
        order_id: i64,
        reason: Option<String>,
    ) -> Result<StatusChange, SettlementError> {
        self.buyer_order(buyer_id, order_id).await?;
        let change =
            self.db.transition_order_status(order_id, OrderStatusType::RefundRequested, buyer_id, reason).await?;
        info!("🔄️ Refund requested for order {order_id} by {buyer_id}");
        Ok(change)
    }

    pub async fn mark_shipped(
        &self,
        actor: &str,
        order_id: i64,
        note: Option<String>,
    ) -> Result<StatusChange, SettlementError> {
        let change = self.db.transition_order_status(order_id, OrderStatusType::Shipped, actor, note).await?;
        info!("🔄️ Order {order_id} shipped ({actor})");
        Ok(change)
    }

    /// Marks the order delivered and releases its escrows.
    pub async fn mark_delivered(
        &self,
        actor: &str,
        order_id: i64,
        note: Option<String>,
    ) -> Result<StatusChange, SettlementError> {
        let change = self.db.transition_order_status(order_id, OrderStatusType::Delivered, actor, note).await?;
        info!("🔄️ Order {order_id} delivered ({actor}). {} escrows released", change.released_escrows.len());
        Ok(change)
    }

    async fn buyer_order(&self, buyer_id: &str, order_id: i64) -> Result<Order, SettlementError> {
        self.db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.buyer_id == buyer_id)
            .ok_or(SettlementError::OrderNotFound(order_id))
    }
}
