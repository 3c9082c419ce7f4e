use std::fmt::Debug;

use crate::{
    db_types::{Escrow, Payment, Payout, Seller, Store},
    settlement_api::{
        errors::SettlementError,
        objects::{BalanceSummary, OrderDetails},
    },
    traits::LedgerManagement,
};

/// Read-only access to the settlement ledger.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    /// The order with its items, audit trail, address, shipments, payments and escrows. If `buyer_id` is given, the
    /// order must belong to that buyer.
    pub async fn order_details(&self, order_id: i64, buyer_id: Option<&str>) -> Result<OrderDetails, SettlementError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| buyer_id.map(|b| b == o.buyer_id).unwrap_or(true))
            .ok_or(SettlementError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        let history = self.db.fetch_order_history(order_id).await?;
        let address = self.db.fetch_shipping_address(order_id).await?;
        let shipments = self.db.fetch_shipments_for_order(order_id).await?;
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        let escrows = self.db.fetch_escrows_for_order(order_id).await?;
        Ok(OrderDetails { order, items, history, address, shipments, payments, escrows })
    }

    pub async fn payment_by_reference(&self, reference: &str) -> Result<Payment, SettlementError> {
        self.db
            .fetch_payment_by_reference(reference)
            .await?
            .ok_or_else(|| SettlementError::PaymentNotFound(reference.to_string()))
    }

    pub async fn seller_for_user(&self, user_id: &str) -> Result<Seller, SettlementError> {
        self.db.fetch_seller_for_user(user_id).await?.ok_or_else(|| SettlementError::SellerNotFound(user_id.into()))
    }

    pub async fn store(&self, store_id: i64) -> Result<Store, SettlementError> {
        self.db.fetch_store(store_id).await?.ok_or(SettlementError::StoreNotFound(store_id))
    }

    /// The seller's escrow balance. A seller who has never been credited has a zero balance.
    pub async fn balance_for_seller(&self, seller_id: i64) -> Result<BalanceSummary, SettlementError> {
        let seller = self
            .db
            .fetch_seller(seller_id)
            .await?
            .ok_or_else(|| SettlementError::SellerNotFound(seller_id.to_string()))?;
        let balance = self.db.fetch_seller_balance(seller.id).await?;
        let store_id = match &balance {
            Some(b) => Some(b.store_id),
            None => self.db.fetch_store_for_seller(seller.id).await?.map(|s| s.id),
        };
        Ok(BalanceSummary { seller_id: seller.id, store_id, balance: balance.map(|b| b.balance).unwrap_or_default() })
    }

    pub async fn balance_for_user(&self, user_id: &str) -> Result<BalanceSummary, SettlementError> {
        let seller = self.seller_for_user(user_id).await?;
        self.balance_for_seller(seller.id).await
    }

    pub async fn balance_for_store(&self, store_id: i64) -> Result<BalanceSummary, SettlementError> {
        let store = self.store(store_id).await?;
        let balance = self.db.fetch_store_balance(store.id).await?.map(|b| b.balance).unwrap_or_default();
        Ok(BalanceSummary { seller_id: store.seller_id, store_id: Some(store.id), balance })
    }

    pub async fn escrows_for_user(&self, user_id: &str) -> Result<Vec<Escrow>, SettlementError> {
        let seller = self.seller_for_user(user_id).await?;
        self.db.fetch_escrows_for_seller(seller.id).await
    }

    pub async fn payouts_for_user(&self, user_id: &str) -> Result<Vec<Payout>, SettlementError> {
        let seller = self.seller_for_user(user_id).await?;
        self.db.fetch_payouts_for_seller(seller.id).await
    }
}
