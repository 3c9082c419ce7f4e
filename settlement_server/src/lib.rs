//! # Marketplace settlement server
//!
//! The HTTP surface of the settlement pipeline. It is responsible for:
//! * Accepting checkouts and charge requests from buyers.
//! * Receiving settlement callbacks from the mobile-money aggregator.
//! * Reporting escrow balances to sellers, and accepting their payout requests.
//! * Order status transitions (cancel, ship, deliver, refund request).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Caller identity
//! Authentication happens upstream. The session layer forwards the caller's identity in the `x-mkt-user-id` and
//! `x-mkt-roles` headers, optionally signed. See [auth](auth/index.html).
//!
//! ## Routes
//! * `GET /health`
//! * `POST /callbacks/momo`: settlement callbacks from the aggregator.
//! * `/api/...`: everything else. See [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
