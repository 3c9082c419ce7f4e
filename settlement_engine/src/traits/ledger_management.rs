use crate::{
    db_types::{
        Escrow,
        EscrowBalance,
        Order,
        OrderItem,
        OrderStatusEntry,
        Payment,
        PaymentMethod,
        PaymentOption,
        Payout,
        Seller,
        Shipment,
        ShippingAddress,
        Store,
    },
    SettlementError,
};

/// Read-only queries over the settlement ledger and the collaborator tables it depends on.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, SettlementError>;

    /// The full audit trail for an order, oldest first.
    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusEntry>, SettlementError>;

    async fn fetch_shipping_address(&self, order_id: i64) -> Result<Option<ShippingAddress>, SettlementError>;

    async fn fetch_shipments_for_order(&self, order_id: i64) -> Result<Vec<Shipment>, SettlementError>;

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, SettlementError>;

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, SettlementError>;

    async fn fetch_escrows_for_order(&self, order_id: i64) -> Result<Vec<Escrow>, SettlementError>;

    async fn fetch_escrows_for_seller(&self, seller_id: i64) -> Result<Vec<Escrow>, SettlementError>;

    async fn fetch_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>, SettlementError>;

    async fn fetch_payment_option(&self, id: i64) -> Result<Option<PaymentOption>, SettlementError>;

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, SettlementError>;

    async fn fetch_seller_for_user(&self, user_id: &str) -> Result<Option<Seller>, SettlementError>;

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, SettlementError>;

    async fn fetch_store_for_seller(&self, seller_id: i64) -> Result<Option<Store>, SettlementError>;

    /// The seller's escrow balance, or `None` if no escrow has ever been credited to them.
    async fn fetch_seller_balance(&self, seller_id: i64) -> Result<Option<EscrowBalance>, SettlementError>;

    async fn fetch_store_balance(&self, store_id: i64) -> Result<Option<EscrowBalance>, SettlementError>;

    /// Payouts for the seller, newest first.
    async fn fetch_payouts_for_seller(&self, seller_id: i64) -> Result<Vec<Payout>, SettlementError>;
}
