use std::time::Duration;

use accrual_client::AccrualApi;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{
    settlement::{start_settlement_worker, SettlementReconciler},
    AccountApi,
    LedgerDatabase,
    OrderIntakeApi,
    SqliteDatabase,
    WithdrawalApi,
};

use crate::{
    auth::TokenAuthority,
    config::ServerConfig,
    errors::ServerError,
    helpers::prepare_database_path,
    routes::{
        health,
        json_config,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

/// Runs the loyalty service until the HTTP server shuts down (on SIGINT or SIGTERM).
///
/// The database is migrated before anything else starts. The settlement worker runs alongside the HTTP server and is
/// stopped after it, so that no settlement tick is cut short by the process exiting.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    prepare_database_path(&config.database_url)?;
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let accrual = AccrualApi::new(config.accrual.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Using the accrual service at {}", accrual.config().base_url);
    let reconciler = SettlementReconciler::new(db.clone(), accrual, config.reconciler.clone());
    let worker = start_settlement_worker(reconciler);
    let result = match create_server_instance(config, db.clone()) {
        Ok(srv) => srv.await.map_err(|e| ServerError::Unspecified(e.to_string())),
        Err(e) => Err(e),
    };
    info!("💻️ HTTP server has stopped. Shutting down the settlement worker.");
    worker.shutdown().await;
    if let Err(e) = db.close().await {
        warn!("🗃️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let authority = TokenAuthority::new(&config.auth);
    let srv = HttpServer::new(move || {
        let intake_api = OrderIntakeApi::new(db.clone());
        let withdrawal_api = WithdrawalApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("loyalty::access_log"))
            .app_data(web::Data::new(intake_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(authority.clone()))
            .app_data(json_config())
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
