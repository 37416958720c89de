use chrono::Utc;
use log::trace;
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Balance, UserId},
};

/// Makes sure the user has a balance row and takes the write lock on it.
///
/// This is a write, so on SQLite it acquires the database write lock for the rest of the enclosing transaction. Run it
/// as the first statement of any transaction that reads a balance and then changes it; a concurrent transaction doing
/// the same waits here until this one commits or rolls back.
pub async fn lock_balance(user_id: &UserId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("INSERT INTO balances (user_id, updated_at) VALUES ($1, $2) ON CONFLICT(user_id) DO NOTHING")
        .bind(user_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Creates the balance with `current = amount`, or adds `amount` to `current`, in a single statement.
pub async fn upsert_balance(
    user_id: &UserId,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO balances (user_id, current_balance, withdrawn, updated_at) VALUES ($1, $2, 0, $3)
            ON CONFLICT(user_id) DO UPDATE SET
                current_balance = current_balance + excluded.current_balance,
                updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    trace!("🗃️ Credited {amount} to {user_id}");
    Ok(())
}

/// Moves `amount` from the current balance to the withdrawn total.
///
/// The caller must already have checked that the balance covers `amount` in the same transaction. If the row is missing,
/// or the debit would take the balance negative, this fails and nothing is changed.
pub async fn withdraw_balance(
    user_id: &UserId,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE balances SET
                current_balance = current_balance - $1,
                withdrawn = withdrawn + $1,
                updated_at = $2
            WHERE user_id = $3
        "#,
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(user_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::InvariantViolation(format!("{user_id} has no balance to withdraw from")));
    }
    trace!("🗃️ Debited {amount} from {user_id}");
    Ok(())
}

/// The user's balance. A user that has never been credited has a zero balance.
pub async fn fetch_balance(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Balance, SqliteDatabaseError> {
    let balance =
        sqlx::query_as::<_, Balance>("SELECT user_id, current_balance, withdrawn FROM balances WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?
            .unwrap_or_else(|| Balance::empty(user_id.clone()));
    Ok(balance)
}
