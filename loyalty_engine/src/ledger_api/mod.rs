//! # Loyalty engine public API
//!
//! The `ledger_api` module exposes the programmatic API of the loyalty ledger. Transport layers (the HTTP server, or a
//! test harness) only ever talk to these types, never to the database directly.
//!
//! * [`order_intake_api`] accepts order numbers submitted by users.
//! * [`withdrawal_api`] debits a user's balance against a withdrawal request.
//! * [`accounts_api`] answers read-only questions about balances, orders and withdrawals.
//!
//! Settlement of orders against the accrual service is not here. It runs in the background; see
//! [`crate::settlement`].
//!
//! # API usage
//!
//! Every API is created by handing it a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use loyalty_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty.db", 25).await?;
//! let api = AccountApi::new(db);
//! let balance = api.balance(&"alice".into()).await?;
//! ```
pub mod accounts_api;
pub mod order_intake_api;
pub mod withdrawal_api;

use std::str::FromStr;

use loyalty_common::is_valid_order_number;

use crate::{db_types::OrderNumber, errors::LedgerError};

/// Parses a user-supplied order number. It must be all digits and pass the Luhn check.
pub fn parse_order_number(number: &str) -> Result<OrderNumber, LedgerError> {
    let number = OrderNumber::from_str(number).map_err(|e| LedgerError::Validation(e.to_string()))?;
    if !is_valid_order_number(number.as_str()) {
        return Err(LedgerError::Validation(format!("Order number {number} failed the checksum")));
    }
    Ok(number)
}
