use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{InsertOrderResult, LedgerDatabase},
    db_types::{NewOrder, Order, UserId},
    errors::LedgerError,
    ledger_api::parse_order_number,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// A brand-new order. It is in status `NEW` and will be picked up by the next settlement tick.
    Accepted(Order),
    /// The user already submitted this order number. Nothing changed.
    AlreadySubmitted(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            SubmitOrderResult::Accepted(o) | SubmitOrderResult::AlreadySubmitted(o) => o,
        }
    }
}

/// `OrderIntakeApi` accepts order numbers from users and opens them on the ledger.
pub struct OrderIntakeApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderIntakeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderIntakeApi ({:?})", self.db)
    }
}

impl<B> OrderIntakeApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Submits an order number on behalf of `user_id`.
    ///
    /// Order numbers are unique across all users:
    /// * A number that fails the checksum is a [`LedgerError::Validation`] error.
    /// * A number that belongs to another user is a [`LedgerError::Conflict`] error.
    /// * Submitting the same number twice for the same user succeeds both times, and returns
    ///   [`SubmitOrderResult::AlreadySubmitted`] the second time.
    pub async fn submit_order(&self, user_id: &UserId, number: &str) -> Result<SubmitOrderResult, LedgerError> {
        let number = parse_order_number(number)?;
        let order = NewOrder::new(number.clone(), user_id.clone());
        match self.db.submit_order(order).await? {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {number} accepted for {user_id}");
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::ExistsForThisUser(order) => {
                debug!("📦️ Order {number} was already submitted by {user_id}");
                Ok(SubmitOrderResult::AlreadySubmitted(order))
            },
            InsertOrderResult::ExistsForOtherUser => {
                warn!("📦️ {user_id} tried to submit order {number}, which belongs to another user");
                Err(LedgerError::Conflict(format!("Order {number} was submitted by another user")))
            },
        }
    }
}
