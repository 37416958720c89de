use std::time::Duration;

use loyalty_engine::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to the accrual service failed: {0}")]
    RequestError(String),
    #[error("The accrual service did not answer in time: {0}")]
    Timeout(String),
    #[error("The accrual service is rate limiting requests")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Cannot query the accrual service for order number '{0}'")]
    InvalidOrderNumber(String),
}

impl From<reqwest::Error> for AccrualApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AccrualApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            AccrualApiError::JsonError(e.to_string())
        } else {
            AccrualApiError::RequestError(e.to_string())
        }
    }
}

/// Every accrual failure is transient from the ledger's point of view. The order stays pending and is asked about
/// again on a later tick.
impl From<AccrualApiError> for LedgerError {
    fn from(e: AccrualApiError) -> Self {
        let retry_after = match &e {
            AccrualApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        };
        LedgerError::TransientGateway { message: e.to_string(), retry_after }
    }
}
