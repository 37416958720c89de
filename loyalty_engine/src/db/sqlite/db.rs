use std::{fmt::Debug, panic::AssertUnwindSafe};

use futures_util::{future::BoxFuture, FutureExt};
use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::{balances, db_url, new_pool, orders, withdrawals, SqliteDatabaseError};
use crate::{
    db::traits::{AccountManagement, InsertOrderResult, LedgerDatabase, SettlementOutcome},
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatus, OrderUpdate, UserId, Withdrawal},
    errors::LedgerError,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn submit_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError> {
        self.in_transaction(move |conn| {
            Box::pin(async move {
                balances::lock_balance(&order.user_id, conn).await?;
                let result = orders::idempotent_insert(order, conn).await?;
                Ok::<_, LedgerError>(result)
            })
        })
        .await
    }

    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        self.in_transaction(move |conn| {
            Box::pin(async move {
                balances::lock_balance(&withdrawal.user_id, conn).await?;
                let balance = balances::fetch_balance(&withdrawal.user_id, conn).await?;
                if withdrawal.sum > balance.current {
                    debug!(
                        "🗃️ {} asked for {} but only has {}. Rolling back.",
                        withdrawal.user_id, withdrawal.sum, balance.current
                    );
                    return Err(LedgerError::InsufficientBalance {
                        requested: withdrawal.sum,
                        available: balance.current,
                    });
                }
                let (user_id, sum) = (withdrawal.user_id.clone(), withdrawal.sum);
                let record = withdrawals::insert_withdrawal(withdrawal, conn).await?;
                balances::withdraw_balance(&user_id, sum, conn).await?;
                Ok(record)
            })
        })
        .await
    }

    async fn fetch_unprocessed_orders(&self, limit: usize) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let orders = orders::fetch_unprocessed_orders(limit, &mut conn).await?;
        Ok(orders)
    }

    async fn settle_order(&self, update: OrderUpdate) -> Result<SettlementOutcome, LedgerError> {
        self.in_transaction(move |conn| {
            Box::pin(async move {
                let outcome = apply_settlement(update, conn).await?;
                Ok::<_, LedgerError>(outcome)
            })
        })
        .await
    }

    async fn settle_batch(&self, updates: Vec<OrderUpdate>) -> Result<Vec<SettlementOutcome>, LedgerError> {
        self.in_transaction(move |conn| {
            Box::pin(async move {
                let mut outcomes = Vec::with_capacity(updates.len());
                for update in updates {
                    outcomes.push(apply_settlement(update, conn).await?);
                }
                Ok::<_, LedgerError>(outcomes)
            })
        })
        .await
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Writes a single settlement result. The status change and the credit either both happen or, if the order was already
/// terminal, neither does.
async fn apply_settlement(
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, SqliteDatabaseError> {
    if update.status == OrderStatus::Processed && update.accrual.is_none() {
        return Err(SqliteDatabaseError::InvariantViolation(format!(
            "Order {} cannot be marked as processed without an accrual",
            update.number
        )));
    }
    if !orders::update_order(&update, conn).await? {
        debug!("🗃️ Order {} was already settled. Nothing to do.", update.number);
        return Ok(SettlementOutcome::AlreadySettled { number: update.number });
    }
    let outcome = match update.credit() {
        Some(amount) => {
            balances::upsert_balance(&update.user_id, amount, conn).await?;
            info!("🗃️ Order {} is processed. {amount} credited to {}", update.number, update.user_id);
            SettlementOutcome::Credited { number: update.number, user_id: update.user_id, amount }
        },
        None => SettlementOutcome::StatusUpdated { number: update.number, status: update.status },
    };
    Ok(outcome)
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_balance(&self, user_id: &UserId) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let order = orders::fetch_order(number, &mut conn).await?;
        Ok(order)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs `f` as a single unit of work.
    ///
    /// The transaction is committed if `f` returns `Ok` and rolled back if it returns `Err`. If `f` panics, the
    /// transaction is rolled back and the panic carries on unwinding from here. If the returned future is dropped
    /// before it completes, the transaction is rolled back when its guard is dropped.
    pub async fn in_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send,
        E: From<SqliteDatabaseError> + Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(SqliteDatabaseError::from)?;
        let result = AssertUnwindSafe(f(&mut *tx)).catch_unwind().await;
        match result {
            Ok(Ok(value)) => {
                tx.commit().await.map_err(SqliteDatabaseError::from)?;
                Ok(value)
            },
            Ok(Err(e)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("🗃️ Rolling back a failed transaction also failed. {rollback_err}");
                }
                Err(e)
            },
            Err(panic) => {
                error!("🗃️ A panic occurred inside a transaction. Rolling back.");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("🗃️ Rollback after panic failed. {rollback_err}");
                }
                std::panic::resume_unwind(panic)
            },
        }
    }
}
