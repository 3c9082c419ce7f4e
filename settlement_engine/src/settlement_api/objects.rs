use mkt_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        AddressFields,
        Escrow,
        Order,
        OrderItem,
        OrderStatusEntry,
        Payment,
        PaymentStatus,
        Shipment,
        ShippingAddress,
    },
    traits::SettledPayment,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub address: AddressFields,
    pub payment_method_id: Option<i64>,
    pub payment_option_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeInitiation {
    pub order_id: i64,
    pub payment_option_id: i64,
    pub payment_method_id: Option<i64>,
    /// E.164 mobile number, `+<country code><9 digits>`. Required for `pay_now`.
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiated {
    pub payment_id: i64,
    pub order_id: i64,
    pub reference: String,
    pub gateway_reference: Option<String>,
    pub amount: Money,
    pub status: PaymentStatus,
    pub message: Option<String>,
}

impl From<Payment> for PaymentInitiated {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.id,
            order_id: p.order_id,
            reference: p.reference,
            gateway_reference: p.gateway_reference,
            amount: p.amount,
            status: p.status,
            message: p.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Successful,
    Failed,
}

/// A settlement notification from the charge gateway, already normalised by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackNotification {
    pub reference: String,
    pub status: CallbackStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallbackOutcome {
    Settled(SettledPayment),
    Failed(Payment),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub amount: Money,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusEntry>,
    pub address: Option<ShippingAddress>,
    pub shipments: Vec<Shipment>,
    pub payments: Vec<Payment>,
    pub escrows: Vec<Escrow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSummary {
    pub seller_id: i64,
    pub store_id: Option<i64>,
    pub balance: Money,
}
