//! Marketplace Settlement Engine
//!
//! This library holds the order settlement pipeline of the marketplace backend: checkout, charge initiation over a
//! mobile-money gateway, the settlement callback with its escrow fan-out, and seller payouts.
//!
//! The library is divided into three main sections:
//! 1. The ledger store ([`mod@sqlite`]). SQLite is the supported backend. You should never need to access the
//!    database directly. Instead, use the public API. The exception is the data types used in the database, which are
//!    defined in [`mod@db_types`].
//! 2. The backend and gateway contracts ([`mod@traits`]). A backend implements [`SettlementDatabase`] and
//!    [`LedgerManagement`]; a payment provider implements [`ChargeGateway`] and [`PayoutGateway`].
//! 3. The settlement API. [`CheckoutApi`], [`PaymentApi`], [`CallbackApi`], [`PayoutApi`], [`OrderFlowApi`] and
//!    [`LedgerApi`] are the entry points for callers. None of them reads the current user from ambient state; the
//!    caller's identity is always passed in.
pub mod db_types;
pub mod helpers;
mod settlement_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use settlement_api::{
    callback_api::CallbackApi,
    checkout_api::CheckoutApi,
    errors::{ErrorCategory, FieldError, ReconciliationReport, SettlementError},
    ledger_api::LedgerApi,
    objects,
    order_flow_api::OrderFlowApi,
    payment_api::PaymentApi,
    payout_api::PayoutApi,
    policy::{SettlementPolicy, WithdrawalPolicy, DEFAULT_SHIPPING_COST},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{ChargeGateway, LedgerManagement, PayoutGateway, SettlementDatabase};
