//! The settlement pipeline's public API.
//!
//! Each API struct is generic over its backend (and, for the orchestrators, over the gateway client), and receives
//! the caller's identity as an explicit argument on every call.
pub mod callback_api;
pub mod checkout_api;
pub mod errors;
pub mod ledger_api;
pub mod objects;
pub mod order_flow_api;
pub mod payment_api;
pub mod payout_api;
pub mod policy;
