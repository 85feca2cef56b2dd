//! Persistent account storage
//!
//! This module implements the storage layer: one SQLite table, one row per
//! account, keyed by username. It knows nothing about passwords; callers hand
//! it already-computed credential hashes.

mod account_store;
mod schema;

pub use account_store::AccountStore;
