use std::future::Future;

use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderNumber, OrderStatus, OrderUpdate},
    errors::LedgerError,
};

/// Order status as reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The accrual service knows about the order but has not started on it.
    Registered,
    Processing,
    Processed,
    Invalid,
}

impl From<AccrualStatus> for OrderStatus {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => OrderStatus::New,
            AccrualStatus::Processing => OrderStatus::Processing,
            AccrualStatus::Processed => OrderStatus::Processed,
            AccrualStatus::Invalid => OrderStatus::Invalid,
        }
    }
}

/// The body of the accrual service's answer for one order.
///
/// Only `status` is guaranteed. The order number is echoed back by some accrual services and not others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualUpdate {
    #[serde(default, alias = "number", skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderNumber>,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualResponse {
    Update(AccrualUpdate),
    /// The accrual service has never heard of this order.
    NotRegistered,
}

impl AccrualUpdate {
    /// Turns the accrual service's answer into a ledger update for `order`.
    ///
    /// A `PROCESSED` answer must carry a non-negative accrual. Accruals on any other status are ignored. If the answer
    /// names an order, it must be the one that was asked about. Answers that break these rules are treated as a gateway
    /// error, so the order is left alone until the next tick.
    pub fn into_order_update(self, order: &Order) -> Result<OrderUpdate, LedgerError> {
        if let Some(answered) = self.order.as_ref().filter(|n| **n != order.number) {
            return Err(LedgerError::gateway(format!(
                "Asked about order {} but the accrual service answered for {answered}",
                order.number
            )));
        }
        let status = OrderStatus::from(self.status);
        let accrual = match (status, self.accrual) {
            (OrderStatus::Processed, Some(amount)) if !amount.is_negative() => Some(amount),
            (OrderStatus::Processed, Some(amount)) => {
                return Err(LedgerError::gateway(format!("Order {} has a negative accrual of {amount}", order.number)))
            },
            (OrderStatus::Processed, None) => {
                return Err(LedgerError::gateway(format!("Order {} is processed but has no accrual", order.number)))
            },
            (_, _) => None,
        };
        Ok(OrderUpdate { number: order.number.clone(), user_id: order.user_id.clone(), status, accrual })
    }
}

/// A source of accrual results. The production implementation is an HTTP client; tests script their own.
///
/// Implementations report every failure (network errors, timeouts, unexpected status codes, malformed bodies) as
/// [`LedgerError::TransientGateway`].
pub trait AccrualGateway: Send + Sync + 'static {
    fn fetch_accrual(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualResponse, LedgerError>> + Send;
}
