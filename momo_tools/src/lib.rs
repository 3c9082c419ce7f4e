//! A thin client for the mobile-money aggregator.
//!
//! The aggregator exposes three operations that the marketplace needs:
//! * `POST /oauth/token` exchanges the client credentials for a short-lived bearer token.
//! * `POST /collections` prompts a buyer's handset to approve a charge. The outcome arrives later as a callback.
//! * `POST /disbursements` sends money to a seller's wallet and answers synchronously.
//!
//! This crate knows nothing about orders or escrows. The server bridges it into the settlement engine's gateway traits.
mod api;
mod config;
mod data_objects;
mod error;
pub mod helpers;

pub use api::MomoApi;
pub use config::MomoConfig;
pub use data_objects::{
    AccessToken,
    CallbackPayload,
    CollectionRequest,
    DisbursementRequest,
    TransactionResponse,
    TransactionState,
};
pub use error::MomoApiError;
