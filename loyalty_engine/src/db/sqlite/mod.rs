mod db;
mod errors;

pub mod balances;
pub mod orders;
pub mod withdrawals;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/loyalty.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The database URL, taken from `LOYALTY_DATABASE_URL`, then `DATABASE_URI`, falling back to a local file.
pub fn db_url() -> String {
    let result = env::var("LOYALTY_DATABASE_URL").or_else(|_| env::var("DATABASE_URI")).unwrap_or_else(|_| {
        info!("🗃️ LOYALTY_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Creates a connection pool. The database file is created if it does not exist yet.
///
/// Every connection has a busy timeout, so that a writer that finds the database locked by another transaction waits
/// for the lock instead of failing straight away. This is what serialises competing balance updates.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
