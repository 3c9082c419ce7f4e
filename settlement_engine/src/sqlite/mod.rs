//! SQLite backend for the settlement ledger.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
