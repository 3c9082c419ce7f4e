use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Created by checkout. No settled payment yet.
    Pending,
    /// A charge for the order has been settled by the gateway and escrows have been created.
    Paid,
    Shipped,
    Delivered,
    /// Cancelled by the buyer before payment.
    Cancelled,
    /// The buyer has asked for a refund of a paid or delivered order.
    RefundRequested,
}

impl OrderStatusType {
    /// Whether a manual status change from `self` to `next` is allowed.
    ///
    /// `Paid` is never a manual target. Orders only become paid through a settled gateway callback.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Cancelled) |
                (Paid, Shipped) |
                (Shipped, Delivered) |
                (Paid, RefundRequested) |
                (Delivered, RefundRequested)
        )
    }

    /// The states from which a manual transition into `target` is allowed.
    pub fn valid_sources(target: OrderStatusType) -> Vec<OrderStatusType> {
        use OrderStatusType::*;
        [Pending, Paid, Shipped, Delivered, Cancelled, RefundRequested]
            .into_iter()
            .filter(|s| s.can_transition_to(target))
            .collect()
    }

    /// A description of why an order in this state cannot be charged.
    pub fn payability_message(&self) -> &'static str {
        use OrderStatusType::*;
        match self {
            Pending => "Order is awaiting payment",
            Paid => "Order has already been paid",
            Shipped => "Order has already been shipped",
            Delivered => "Order has already been delivered",
            Cancelled => "Order has been cancelled",
            RefundRequested => "A refund has been requested for this order",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Paid => "paid",
            OrderStatusType::Shipped => "shipped",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::RefundRequested => "refund_requested",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refund_requested" => Ok(Self::RefundRequested),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Successful => write!(f, "successful"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------     EscrowStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Holding,
    Released,
    Refunded,
}

impl Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscrowStatus::Holding => write!(f, "holding"),
            EscrowStatus::Released => write!(f, "released"),
            EscrowStatus::Refunded => write!(f, "refunded"),
        }
    }
}

//--------------------------------------     PayoutStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "pending"),
            PayoutStatus::Processing => write!(f, "processing"),
            PayoutStatus::Completed => write!(f, "completed"),
            PayoutStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------    ShipmentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Shipped,
    Delivered,
}

//--------------------------------------    MobileNetwork      ---------------------------------------------------------
/// The mobile network operators that the charge and payout gateways can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MobileNetwork {
    Mtn,
    Airtel,
}

impl Display for MobileNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MobileNetwork::Mtn => write!(f, "MTN"),
            MobileNetwork::Airtel => write!(f, "AIRTEL"),
        }
    }
}

impl FromStr for MobileNetwork {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MTN" => Ok(Self::Mtn),
            "AIRTEL" => Ok(Self::Airtel),
            s => Err(ConversionError(format!("Unknown mobile network: {s}"))),
        }
    }
}

//--------------------------------------  PaymentOptionKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentOptionKind {
    /// Charge the buyer's mobile wallet immediately.
    PayNow,
    /// Schedule a direct charge for later.
    PayLater,
    /// Send a payment request to a third party.
    RequestPayment,
}

impl PaymentOptionKind {
    /// Options that end in a direct charge against a payment method need that method to be selected and enabled.
    pub fn requires_payment_method(&self) -> bool {
        matches!(self, PaymentOptionKind::PayNow | PaymentOptionKind::PayLater)
    }
}

impl Display for PaymentOptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOptionKind::PayNow => write!(f, "pay_now"),
            PaymentOptionKind::PayLater => write!(f, "pay_later"),
            PaymentOptionKind::RequestPayment => write!(f, "request_payment"),
        }
    }
}

//--------------------------------------   Collaborator rows   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub payout_phone: String,
    pub payout_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub network: MobileNetwork,
    pub enabled: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentOption {
    pub id: i64,
    pub name: String,
    pub kind: PaymentOptionKind,
}

/// A cart line, with the price snapshot taken when the product was added to the cart.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-readable order reference, e.g. `ORD-7K2D9QX4LM`
    pub reference: String,
    pub buyer_id: String,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
    pub status: OrderStatusType,
    pub payment_method_id: Option<i64>,
    pub payment_option_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price at the time of purchase. Never follows later product price changes.
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

/// An order line together with the seller and store that own the product.
#[derive(Debug, Clone, FromRow)]
pub struct SellerOrderLine {
    pub order_item_id: i64,
    pub seller_id: i64,
    pub store_id: i64,
    pub quantity: i64,
    pub price: Money,
}

/// One row of the append-only order audit trail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderStatusEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    pub changed_by: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressFields {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub region_id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: i64,
    pub order_id: i64,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub region_id: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: i64,
    pub store_id: i64,
    pub shipping_address_id: i64,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   Checkout / NewOrder  --------------------------------------------------------
/// Everything checkout needs to turn a buyer's cart into an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: String,
    pub address: AddressFields,
    pub payment_method_id: Option<i64>,
    pub payment_option_id: i64,
    pub shipping_cost: Money,
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub user_id: String,
    pub amount: Money,
    pub payment_method_id: Option<i64>,
    pub payment_option_id: i64,
    pub phone: Option<String>,
    /// The correlation reference shared with the gateway. Callbacks are matched on this value.
    pub reference: String,
    /// The gateway's own identifier for the charge, if it returned one.
    pub gateway_reference: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub user_id: String,
    pub amount: Money,
    pub payment_method_id: Option<i64>,
    pub payment_option_id: i64,
    pub phone: Option<String>,
    pub reference: String,
    pub gateway_reference: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

//--------------------------------------        Escrow         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Escrow {
    pub id: i64,
    pub order_id: i64,
    pub buyer_id: String,
    pub seller_id: i64,
    pub store_id: i64,
    pub payment_id: i64,
    pub total_amount: Money,
    pub seller_amount: Money,
    pub platform_fee: Money,
    pub fee_rate_bps: i64,
    pub status: EscrowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EscrowBalance {
    pub id: i64,
    pub seller_id: i64,
    pub store_id: i64,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Payout         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub seller_id: i64,
    pub store_id: i64,
    pub amount: Money,
    pub reference: String,
    pub transaction_id: Option<String>,
    pub payment_method: String,
    pub destination_account: String,
    pub status: PayoutStatus,
    pub message: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayout {
    pub seller_id: i64,
    pub store_id: i64,
    pub amount: Money,
    pub reference: String,
    pub transaction_id: Option<String>,
    pub payment_method: String,
    pub destination_account: String,
    pub status: PayoutStatus,
    pub message: Option<String>,
    pub note: Option<String>,
}
