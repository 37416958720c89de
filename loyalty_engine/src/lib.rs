//! Loyalty Engine
//!
//! The Loyalty Engine keeps the books for a loyalty-points programme. Users submit the numbers of orders they have
//! placed; an external accrual service eventually decides how many points each order earns; the engine credits those
//! points to the user's balance exactly once, and lets users spend (withdraw) points against their current balance.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the data types used in
//!    the database. These are defined in the `db_types` module and are public.
//! 2. The engine's public API ([`mod@ledger_api`]): order intake, withdrawals and account queries.
//! 3. Settlement ([`mod@settlement`]): the background reconciler that polls the accrual service and credits balances.
//!
//! All errors are reported as a [`LedgerError`], which classifies them into validation errors, conflicts, insufficient
//! balance, transient failures and fatal errors, so that transport layers can map them without knowing about storage.
mod db;

pub mod db_types;
pub mod errors;
pub mod ledger_api;
pub mod settlement;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{balances, db_url, new_pool, orders, withdrawals, SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{AccountManagement, InsertOrderResult, LedgerDatabase, SettlementOutcome};
pub use errors::{ErrorKind, LedgerError};
pub use ledger_api::{
    accounts_api::AccountApi,
    order_intake_api::{OrderIntakeApi, SubmitOrderResult},
    parse_order_number,
    withdrawal_api::WithdrawalApi,
};
