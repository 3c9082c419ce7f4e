//! # Ledger and gateway interfaces
//!
//! These traits define the contracts between the settlement APIs and their backends.
//!
//! * [`SettlementDatabase`] performs every mutating ledger operation as a single atomic unit.
//! * [`LedgerManagement`] provides read-only queries over orders, payments, escrows and payouts.
//! * [`ChargeGateway`] and [`PayoutGateway`] abstract the external mobile-money provider, so that providers can be
//!   swapped without touching the orchestration logic.
mod data_objects;
mod gateways;
mod ledger_management;
mod settlement_database;

pub use data_objects::{CheckoutResult, RecordedPayout, SettledPayment, StatusChange};
pub use gateways::{
    ChargeAccepted,
    ChargeGateway,
    ChargeRequest,
    DisbursementReceipt,
    DisbursementRequest,
    GatewayError,
    PayoutGateway,
};
pub use ledger_management::LedgerManagement;
pub use settlement_database::SettlementDatabase;
