use std::future::Future;

use crate::{
    db::traits::{InsertOrderResult, SettlementOutcome},
    db_types::{NewOrder, NewWithdrawal, Order, OrderUpdate, Withdrawal},
    errors::LedgerError,
};

/// The highest level of behaviour a storage backend provides to the loyalty engine.
///
/// Every method is one unit of work: it either commits in full or leaves storage untouched. The futures are `Send` so
/// that the settlement reconciler can drive a backend from a spawned task.
pub trait LedgerDatabase: Clone + Send + Sync + 'static {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order, and in a single atomic transaction,
    /// * makes sure the user has a balance row (at zero if the user is new),
    /// * checks whether the order number is already known, for any user,
    /// * inserts the order with status `NEW` if it is not.
    fn submit_order(&self, order: NewOrder) -> impl Future<Output = Result<InsertOrderResult, LedgerError>> + Send;

    /// Takes a withdrawal request, and in a single atomic transaction,
    /// * acquires exclusive access to the user's balance,
    /// * rejects the request with [`LedgerError::InsufficientBalance`] if the balance does not cover it,
    /// * records the withdrawal and debits the balance.
    ///
    /// Two concurrent withdrawals for the same user are serialised, so they can never both pass the balance check.
    fn withdraw(&self, withdrawal: NewWithdrawal) -> impl Future<Output = Result<Withdrawal, LedgerError>> + Send;

    /// Orders in status `NEW` or `PROCESSING`, oldest first, at most `limit` of them.
    fn fetch_unprocessed_orders(&self, limit: usize) -> impl Future<Output = Result<Vec<Order>, LedgerError>> + Send;

    /// Writes one accrual result, in its own transaction. If the update moves the order to `PROCESSED`, the owner is
    /// credited in the same transaction. Orders that are already terminal are left alone and reported as
    /// [`SettlementOutcome::AlreadySettled`].
    fn settle_order(&self, update: OrderUpdate) -> impl Future<Output = Result<SettlementOutcome, LedgerError>> + Send;

    /// As [`LedgerDatabase::settle_order`], but every update is written in one shared transaction. Any failure rolls
    /// back the whole batch.
    fn settle_batch(
        &self,
        updates: Vec<OrderUpdate>,
    ) -> impl Future<Output = Result<Vec<SettlementOutcome>, LedgerError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), LedgerError>> + Send;
}
