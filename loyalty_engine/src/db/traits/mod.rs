//! #  Ledger storage contracts.
//!
//! The traits in this module are what a storage backend has to provide for the loyalty engine to run on top of it.
//!
//! * [`LedgerDatabase`] covers every operation that changes ledger state: accepting orders, recording withdrawals and
//!   applying settlement results. Each of these runs as a single unit of work in the backend, so that orders, balances
//!   and withdrawals can never be observed out of step with each other.
//! * [`AccountManagement`] is read-only. It answers questions about a user's orders, balance and withdrawals.
mod account_management;
mod data_objects;
mod ledger_database;

pub use account_management::AccountManagement;
pub use data_objects::{InsertOrderResult, SettlementOutcome};
pub use ledger_database::LedgerDatabase;
