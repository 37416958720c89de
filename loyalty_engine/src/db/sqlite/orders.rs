use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertOrderResult},
    db_types::{NewOrder, Order, OrderNumber, OrderStatus, OrderUpdate, UserId},
};

const ORDER_COLUMNS: &str = "order_number, order_status, user_id, accrual, uploaded_at";

/// Inserts the order unless an order with the same number already exists, for any user.
///
/// This is not atomic on its own. Run it inside a transaction (pass `&mut *tx`) so that the existence check and the
/// insert see the same snapshot.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let result = match fetch_order(&order.number, conn).await? {
        Some(existing) if existing.user_id == order.user_id => InsertOrderResult::ExistsForThisUser(existing),
        Some(existing) => {
            trace!("🗃️ Order {} is already owned by another user", existing.number);
            InsertOrderResult::ExistsForOtherUser
        },
        None => InsertOrderResult::Inserted(insert_order(order, conn).await?),
    };
    Ok(result)
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO orders (order_number, order_status, user_id, uploaded_at, updated_at) VALUES ($1, $2, $3, $4, $4) \
         RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(&order.number)
        .bind(OrderStatus::New)
        .bind(&order.user_id)
        .bind(order.uploaded_at)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order {} has been saved for user {}", order.number, order.user_id);
    Ok(order)
}

pub async fn fetch_order(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(number).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, rowid ASC");
    let orders = sqlx::query_as::<_, Order>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}

/// Orders that are still waiting on the accrual service, oldest first.
pub async fn fetch_unprocessed_orders(
    limit: usize,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_status IN ('NEW', 'PROCESSING') ORDER BY uploaded_at ASC, \
         rowid ASC LIMIT $1"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let orders = sqlx::query_as::<_, Order>(&sql).bind(limit).fetch_all(conn).await?;
    trace!("🗃️ {} orders are awaiting settlement", orders.len());
    Ok(orders)
}

/// Sets the status and accrual of an order, but only while the order is not yet terminal.
///
/// Returns `true` if a row was changed. A `false` result means another writer already settled the order, and the caller
/// must not credit anything for it.
pub async fn update_order(update: &OrderUpdate, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET order_status = $1, accrual = $2, updated_at = $3
            WHERE order_number = $4 AND order_status IN ('NEW', 'PROCESSING')
        "#,
    )
    .bind(update.status)
    .bind(update.accrual)
    .bind(Utc::now())
    .bind(&update.number)
    .execute(conn)
    .await?;
    let changed = result.rows_affected() > 0;
    trace!("🗃️ Order {} -> {}: changed = {changed}", update.number, update.status);
    Ok(changed)
}
