//! Helpers for tests that need a real ledger: throwaway SQLite databases, scripted gateways and seed data.
pub mod fakes;
pub mod fixtures;
pub mod prepare_env;
