use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewWithdrawal, UserId, Withdrawal},
};

/// Records a withdrawal. This does not touch the balance; pair it with `balances::withdraw_balance` in one transaction.
pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, SqliteDatabaseError> {
    let withdrawal = sqlx::query_as::<_, Withdrawal>(
        r#"
            INSERT INTO withdrawals (order_number, user_id, sum, processed_at) VALUES ($1, $2, $3, $4)
            RETURNING order_number, user_id, sum, processed_at
        "#,
    )
    .bind(&withdrawal.order_number)
    .bind(&withdrawal.user_id)
    .bind(withdrawal.sum)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Withdrawal of {} against {} recorded for {}", withdrawal.sum, withdrawal.order_number, withdrawal.user_id);
    Ok(withdrawal)
}

pub async fn fetch_withdrawals_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, SqliteDatabaseError> {
    let withdrawals = sqlx::query_as::<_, Withdrawal>(
        r#"
            SELECT order_number, user_id, sum, processed_at FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(withdrawals)
}
