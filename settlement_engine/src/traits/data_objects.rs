use mkt_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Escrow, Order, OrderItem, OrderStatusEntry, Payment, Payout, Shipment, ShippingAddress};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: ShippingAddress,
}

/// The ledger state produced by a successful gateway callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledPayment {
    pub payment: Payment,
    pub order: Order,
    pub escrows: Vec<Escrow>,
    pub shipments: Vec<Shipment>,
}

impl SettledPayment {
    pub fn total_platform_fee(&self) -> Money {
        self.escrows.iter().map(|e| e.platform_fee).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedPayout {
    pub payout: Payout,
    pub balance_before: Money,
    pub balance_after: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub order: Order,
    pub entry: OrderStatusEntry,
    /// Escrows that moved from `holding` to `released` as part of this change.
    pub released_escrows: Vec<Escrow>,
}
