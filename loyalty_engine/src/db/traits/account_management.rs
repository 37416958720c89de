use crate::{
    db_types::{Balance, Order, OrderNumber, UserId, Withdrawal},
    errors::LedgerError,
};

/// Read-only queries about a user's standing in the ledger.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// The user's balance. Users that have never been credited get a zero balance rather than `None`.
    async fn fetch_balance(&self, user_id: &UserId) -> Result<Balance, LedgerError>;

    /// All orders the user has submitted, oldest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError>;

    /// All withdrawals the user has made, oldest first.
    async fn fetch_withdrawals_for_user(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError>;

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;
}
