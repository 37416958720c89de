//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: pull the user out of the access token, hand the
//! request to the ledger API, and turn the result into a response. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every ledger call is asynchronous, so handlers simply `await` them.
use actix_web::{get, web, HttpResponse, Responder};
use bytes::Bytes;
use log::*;
use loyalty_engine::{AccountApi, AccountManagement, LedgerDatabase, OrderIntakeApi, SubmitOrderResult, WithdrawalApi};

use crate::{auth::JwtClaims, data_objects::WithdrawalRequest, errors::ServerError, helpers::parse_order_body};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $bound:path) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/user/orders" impl LedgerDatabase);
/// Route handler for submitting an order
///
/// The body is the order number, as plain text or JSON. The user is taken from the access token.
/// * `202 Accepted`: the order is new and will be settled in the background.
/// * `200 OK`: this user already submitted the order. Nothing changed.
/// * `400 Bad Request`: the body is not a number.
/// * `409 Conflict`: another user already submitted the order.
/// * `422 Unprocessable Entity`: the number fails the Luhn check.
pub async fn submit_order<B: LedgerDatabase>(
    claims: JwtClaims,
    body: Bytes,
    api: web::Data<OrderIntakeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id();
    let number = parse_order_body(&body)?;
    debug!("💻️ POST order {number} for {user_id}");
    match api.submit_order(&user_id, &number).await? {
        SubmitOrderResult::Accepted(order) => Ok(HttpResponse::Accepted().json(order)),
        SubmitOrderResult::AlreadySubmitted(order) => Ok(HttpResponse::Ok().json(order)),
    }
}

route!(my_orders => Get "/user/orders" impl AccountManagement);
/// Route handler for the orders endpoint
///
/// Returns the user's orders, oldest first, or `204 No Content` if there are none.
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id();
    debug!("💻️ GET my_orders for {user_id}");
    let orders = api.orders(&user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/user/balance" impl AccountManagement);
pub async fn my_balance<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id();
    debug!("💻️ GET my_balance for {user_id}");
    let balance = api.balance(&user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
route!(withdraw => Post "/user/balance/withdraw" impl LedgerDatabase);
/// Route handler for spending points
///
/// * `200 OK`: the withdrawal was recorded.
/// * `402 Payment Required`: the balance does not cover the sum. Nothing changed.
/// * `422 Unprocessable Entity`: the order number fails the Luhn check, or the sum is not positive.
pub async fn withdraw<B: LedgerDatabase>(
    claims: JwtClaims,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id();
    let WithdrawalRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against {order} for {user_id}");
    let withdrawal = api.withdraw(&user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

route!(my_withdrawals => Get "/user/withdrawals" impl AccountManagement);
pub async fn my_withdrawals<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id();
    debug!("💻️ GET my_withdrawals for {user_id}");
    let withdrawals = api.withdrawals(&user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(withdrawals))
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}
