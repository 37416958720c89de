use std::fmt::Debug;

use log::*;
use loyalty_common::Points;

use crate::{
    db::traits::LedgerDatabase,
    db_types::{NewWithdrawal, UserId, Withdrawal},
    errors::LedgerError,
    ledger_api::parse_order_number,
};

/// `WithdrawalApi` spends points from a user's current balance.
pub struct WithdrawalApi<B> {
    db: B,
}

impl<B: Debug> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B> WithdrawalApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Withdraws `sum` points from the user's balance against the order number `number`.
    ///
    /// The order number is an opaque reference for the withdrawal; it does not need to be an order on the ledger, but it
    /// must pass the checksum. `sum` must be positive. If the balance does not cover `sum`, the request fails with
    /// [`LedgerError::InsufficientBalance`] and nothing changes.
    pub async fn withdraw(&self, user_id: &UserId, number: &str, sum: Points) -> Result<Withdrawal, LedgerError> {
        let number = parse_order_number(number)?;
        if !sum.is_positive() {
            return Err(LedgerError::Validation(format!("Withdrawal amount must be positive, but was {sum}")));
        }
        let request = NewWithdrawal::new(user_id.clone(), number, sum);
        match self.db.withdraw(request).await {
            Ok(withdrawal) => {
                info!("💸️ {user_id} withdrew {sum} against order {}", withdrawal.order_number);
                Ok(withdrawal)
            },
            Err(e) => {
                debug!("💸️ Withdrawal of {sum} for {user_id} failed. {e}");
                Err(e)
            },
        }
    }
}
