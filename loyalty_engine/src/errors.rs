use std::time::Duration;

use loyalty_common::Points;
use thiserror::Error;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::SqliteDatabaseError;

/// The coarse classification of a [`LedgerError`]. Transport layers map on this rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Conflict,
    InsufficientBalance,
    Transient,
    Fatal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid request. {0}")]
    Validation(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available.")]
    InsufficientBalance { requested: Points, available: Points },
    #[error("Storage is temporarily unavailable. {0}")]
    TransientStorage(String),
    #[error("The accrual service is temporarily unavailable. {message}")]
    TransientGateway { message: String, retry_after: Option<Duration> },
    #[error("Unrecoverable ledger error. {0}")]
    Fatal(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::TransientStorage(_) | LedgerError::TransientGateway { .. } => ErrorKind::Transient,
            LedgerError::Fatal(_) => ErrorKind::Fatal,
        }
    }

    /// Transient errors are worth trying again on the next scheduled attempt. Everything else will fail the same way.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// The delay the accrual service asked for, if it asked for one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LedgerError::TransientGateway { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn gateway<S: Into<String>>(message: S) -> Self {
        LedgerError::TransientGateway { message: message.into(), retry_after: None }
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteDatabaseError> for LedgerError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DriverError(sqlx::Error::Database(db_err)) if is_check_violation(db_err.as_ref()) => {
                LedgerError::Fatal(format!("A ledger constraint was violated. {db_err}"))
            },
            SqliteDatabaseError::DriverError(e) => LedgerError::TransientStorage(e.to_string()),
            SqliteDatabaseError::MigrationError(e) => LedgerError::Fatal(e.to_string()),
            SqliteDatabaseError::QueryError(s) => LedgerError::TransientStorage(s),
            SqliteDatabaseError::InvariantViolation(s) => LedgerError::Fatal(s),
        }
    }
}

#[cfg(feature = "sqlite")]
fn is_check_violation(err: &dyn sqlx::error::DatabaseError) -> bool {
    err.is_check_violation() || err.message().contains("CHECK constraint failed")
}
