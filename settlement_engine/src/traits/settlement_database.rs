use mkt_common::FeeRate;

use crate::{
    db_types::{NewOrder, NewPayment, NewPayout, OrderStatusType, Payment, Payout},
    traits::{CheckoutResult, LedgerManagement, RecordedPayout, SettledPayment, StatusChange},
    SettlementError,
};

/// The mutating half of a settlement backend.
///
/// Every method is one atomic unit: either all of its writes are committed, or none are.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + LedgerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Converts the buyer's cart into a `pending` order.
    ///
    /// * One order item is written per cart line, using the cart's price snapshot.
    /// * The shipping address is bound to the order.
    /// * The first status history entry (`pending`) is appended.
    /// * The cart and its items are deleted.
    ///
    /// An empty or missing cart is rejected with [`SettlementError::EmptyCart`] before anything is written.
    async fn checkout(&self, order: NewOrder) -> Result<CheckoutResult, SettlementError>;

    /// Stores a charge attempt. Both `pending` and `failed` attempts are kept.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError>;

    /// Applies a successful settlement callback for the payment with the given correlation `reference`.
    ///
    /// The payment moves from `pending` to `successful` with a compare-and-set as the first statement of the
    /// transaction, so concurrent duplicate deliveries cannot both observe `pending`. Then the order is marked `paid`,
    /// the items are split by seller at `fee_rate`, one escrow is created per seller, each seller's escrow balance is
    /// credited with their share, and one shipment is created per seller.
    ///
    /// Any failure rolls everything back and leaves the payment `pending`.
    async fn settle_payment(&self, reference: &str, fee_rate: FeeRate) -> Result<SettledPayment, SettlementError>;

    /// Marks a `pending` payment as `failed`, recording the gateway's reason in the notes. The order is untouched.
    async fn fail_payment(&self, reference: &str, reason: &str) -> Result<Payment, SettlementError>;

    /// Stores a payout attempt. If the payout is `completed`, the seller's escrow balance is debited in the same
    /// transaction, guarded by `balance >= amount`.
    ///
    /// If that guard fails, the payout row is still committed (the money has already left) and
    /// [`SettlementError::Reconciliation`] is returned. The balance is never driven below zero.
    async fn record_payout(&self, payout: NewPayout) -> Result<RecordedPayout, SettlementError>;

    /// Writes a payout row on its own, without touching any balance.
    ///
    /// Used after [`Self::record_payout`] has failed for a transfer the gateway already completed, so that the
    /// transfer is at least traceable while it waits for reconciliation.
    async fn record_unreconciled_payout(&self, payout: NewPayout) -> Result<Payout, SettlementError>;

    /// Moves an order to `to`, provided its current status allows it, and appends a history entry. Delivery also
    /// releases the order's escrows and marks its shipments delivered.
    async fn transition_order_status(
        &self,
        order_id: i64,
        to: OrderStatusType,
        changed_by: &str,
        note: Option<String>,
    ) -> Result<StatusChange, SettlementError>;
}
