//! Unifies API for querying user accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db::traits::AccountManagement,
    db_types::{Balance, Order, OrderNumber, UserId, Withdrawal},
    errors::LedgerError,
};

/// The `AccountApi` provides read-only access to users' balances, orders and withdrawals.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn balance(&self, user_id: &UserId) -> Result<Balance, LedgerError> {
        let balance = self.db.fetch_balance(user_id).await?;
        trace!("🧑️ Balance for {user_id}: {} current, {} withdrawn", balance.current, balance.withdrawn);
        Ok(balance)
    }

    pub async fn orders(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn withdrawals(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }

    pub async fn order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order(number).await
    }
}
