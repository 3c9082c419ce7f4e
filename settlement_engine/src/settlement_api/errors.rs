use std::fmt::Display;

use mkt_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderStatusType, PaymentStatus};

/// The broad class of a [`SettlementError`]. Callers branch on this rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed input, rejected before any mutation.
    Validation,
    /// The request is legal in general, but not for the resource's current state.
    StateConflict,
    NotFound,
    /// The external gateway rejected or failed the request. The attempt has been recorded.
    Upstream,
    Internal,
    /// Money has moved externally but the local ledger could not record it. Needs manual reconciliation.
    Reconciliation,
    Unsupported,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::StateConflict => "state_conflict",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Internal => "internal",
            ErrorCategory::Reconciliation => "reconciliation_required",
            ErrorCategory::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Everything needed to reconcile a payout that left the platform but could not be debited from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// `None` when not even the payout row could be written.
    pub payout_id: Option<i64>,
    pub payout_reference: String,
    pub gateway_transaction_id: Option<String>,
    pub seller_id: i64,
    pub store_id: i64,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
}

impl Display for ReconciliationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "payout {} [{}] gateway tx {} for seller #{} (store #{}): amount {}, balance before {}, balance after {}",
            self.payout_id.map(|id| format!("#{id}")).unwrap_or_else(|| "<unrecorded>".into()),
            self.payout_reference,
            self.gateway_transaction_id.as_deref().unwrap_or("<none>"),
            self.seller_id,
            self.store_id,
            self.amount,
            self.balance_before,
            self.balance_after
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Invalid request: {}", display_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("The cart for buyer {0} is empty")]
    EmptyCart(String),
    #[error("Payment method {0} is disabled")]
    PaymentMethodDisabled(i64),
    #[error("The phone number belongs to {found}, but the selected payment method is for {expected}")]
    NetworkMismatch { expected: String, found: String },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("No payment with reference {0} exists")]
    PaymentNotFound(String),
    #[error("No seller account exists for user {0}")]
    SellerNotFound(String),
    #[error("Store {0} does not exist")]
    StoreNotFound(i64),
    #[error("Payment method {0} does not exist")]
    PaymentMethodNotFound(i64),
    #[error("Payment option {0} does not exist")]
    PaymentOptionNotFound(i64),
    #[error("Order {order_id} cannot be paid. {}", .status.payability_message())]
    OrderNotPayable { order_id: i64, status: OrderStatusType },
    #[error("Order {order_id} already has a charge in progress ({reference})")]
    ChargeInProgress { order_id: i64, reference: String },
    #[error("Payment {reference} has already been processed. Its status is {status}")]
    PaymentAlreadyProcessed { reference: String, status: PaymentStatus },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: i64, from: OrderStatusType, to: OrderStatusType },
    #[error("Insufficient escrow balance. Requested {requested}, available {available}")]
    InsufficientBalance { available: Money, requested: Money },
    #[error("The gateway rejected the request (record #{record_id}): {message}")]
    GatewayRejected { record_id: i64, message: String },
    #[error("{0} is not implemented yet")]
    NotImplemented(String),
    #[error("Ledger invariant violated: {0}")]
    LedgerInvariant(String),
    #[error("Reconciliation required. {0}")]
    Reconciliation(Box<ReconciliationReport>),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

fn display_fields(fields: &[FieldError]) -> String {
    fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

impl SettlementError {
    pub fn invalid_field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn category(&self) -> ErrorCategory {
        use SettlementError::*;
        match self {
            Validation(_) | EmptyCart(_) | PaymentMethodDisabled(_) | NetworkMismatch { .. } => {
                ErrorCategory::Validation
            },
            OrderNotFound(_) |
            PaymentNotFound(_) |
            SellerNotFound(_) |
            StoreNotFound(_) |
            PaymentMethodNotFound(_) |
            PaymentOptionNotFound(_) => ErrorCategory::NotFound,
            OrderNotPayable { .. } |
            ChargeInProgress { .. } |
            PaymentAlreadyProcessed { .. } |
            InvalidTransition { .. } |
            InsufficientBalance { .. } => ErrorCategory::StateConflict,
            GatewayRejected { .. } => ErrorCategory::Upstream,
            NotImplemented(_) => ErrorCategory::Unsupported,
            LedgerInvariant(_) | DatabaseError(_) => ErrorCategory::Internal,
            Reconciliation(_) => ErrorCategory::Reconciliation,
        }
    }

    /// Field-level detail for validation failures. Empty for every other category.
    pub fn fields(&self) -> Vec<FieldError> {
        use SettlementError::*;
        match self {
            Validation(fields) => fields.clone(),
            EmptyCart(_) => vec![FieldError::new("cart", "The cart has no items")],
            PaymentMethodDisabled(_) => vec![FieldError::new("payment_method_id", "The payment method is disabled")],
            NetworkMismatch { expected, found } => {
                vec![FieldError::new("phone", format!("Number is on {found}, but the method requires {expected}"))]
            },
            _ => vec![],
        }
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}
