use std::str::FromStr;

use cucumber::{given, then, when};
use futures_util::future::join_all;
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatus, UserId},
    settlement::AccrualStatus,
    ErrorKind,
};

use crate::cucumber::LedgerWorld;

fn points(amount: f64) -> Points {
    Points::try_from(amount).expect("Not a valid amount")
}

fn accrual_status(status: &str) -> AccrualStatus {
    match status {
        "REGISTERED" => AccrualStatus::Registered,
        "PROCESSING" => AccrualStatus::Processing,
        "PROCESSED" => AccrualStatus::Processed,
        "INVALID" => AccrualStatus::Invalid,
        s => panic!("Unknown accrual status: {s}"),
    }
}

#[given(expr = "the accrual service reports order {word} as {word} with {float} points")]
async fn accrual_with_points(world: &mut LedgerWorld, number: String, status: String, amount: f64) {
    world.system().gateway.respond(&number, accrual_status(&status), Some(points(amount)));
}

#[given(expr = "the accrual service reports order {word} as {word}")]
async fn accrual_without_points(world: &mut LedgerWorld, number: String, status: String) {
    world.system().gateway.respond(&number, accrual_status(&status), None);
}

#[given(expr = "the accrual service times out for order {word}")]
async fn accrual_timeout(world: &mut LedgerWorld, number: String) {
    world.system().gateway.fail(&number, "request timed out");
}

#[when("the reconciler runs a tick")]
async fn run_tick(world: &mut LedgerWorld) {
    let result = world.system().reconciler().run_tick().await;
    world.last_tick = Some(result);
}

#[when(expr = "user '{word}' submits order {word}")]
async fn submit_order(world: &mut LedgerWorld, user: String, number: String) {
    let result = world.system().intake().submit_order(&user.into(), &number).await;
    world.last_error = result.err();
}

#[when(expr = "user '{word}' withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LedgerWorld, user: String, amount: f64, number: String) {
    let result = world.system().withdrawals().withdraw(&user.into(), &number, points(amount)).await;
    world.last_error = result.err();
}

#[when(expr = "user '{word}' makes {int} simultaneous withdrawals of {float} points")]
async fn simultaneous_withdrawals(world: &mut LedgerWorld, user: String, count: usize, amount: f64) {
    let user = UserId::from(user);
    let requests = (0..count).map(|_| {
        let api = world.system().withdrawals();
        let user = user.clone();
        tokio::spawn(async move { api.withdraw(&user, "12345678903", points(amount)).await })
    });
    let results = join_all(requests).await;
    world.successes = 0;
    world.failures.clear();
    for result in results {
        match result.expect("Withdrawal task panicked") {
            Ok(_) => world.successes += 1,
            Err(e) => world.failures.push(e),
        }
    }
}

#[then(expr = "order {word} has status {word}")]
async fn order_status(world: &mut LedgerWorld, number: String, status: String) {
    let expected = OrderStatus::from_str(&status).expect("Unknown order status");
    let order = world.system().accounts().order(&OrderNumber::from(number)).await.unwrap().expect("No such order");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has an accrual of {float} points")]
async fn order_accrual(world: &mut LedgerWorld, number: String, amount: f64) {
    let order = world.system().accounts().order(&OrderNumber::from(number)).await.unwrap().expect("No such order");
    assert_eq!(order.accrual, Some(points(amount)));
}

#[then(expr = "order {word} has no accrual")]
async fn order_no_accrual(world: &mut LedgerWorld, number: String) {
    let order = world.system().accounts().order(&OrderNumber::from(number)).await.unwrap().expect("No such order");
    assert_eq!(order.accrual, None);
}

#[then(expr = "user '{word}' has a balance of {float} points")]
async fn check_balance(world: &mut LedgerWorld, user: String, amount: f64) {
    let balance = world.system().accounts().balance(&user.into()).await.unwrap();
    assert_eq!(balance.current, points(amount), "Current balance is incorrect");
}

#[then(expr = "user '{word}' has withdrawn {float} points")]
async fn check_withdrawn(world: &mut LedgerWorld, user: String, amount: f64) {
    let balance = world.system().accounts().balance(&user.into()).await.unwrap();
    assert_eq!(balance.withdrawn, points(amount), "Withdrawn total is incorrect");
}

#[then(expr = "user '{word}' has {int} orders")]
async fn check_order_count(world: &mut LedgerWorld, user: String, count: usize) {
    let orders = world.system().accounts().orders(&user.into()).await.unwrap();
    assert_eq!(orders.len(), count);
}

#[then(expr = "user '{word}' has {int} withdrawals")]
async fn check_withdrawal_count(world: &mut LedgerWorld, user: String, count: usize) {
    let withdrawals = world.system().accounts().withdrawals(&user.into()).await.unwrap();
    assert_eq!(withdrawals.len(), count);
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut LedgerWorld) {
    assert!(world.last_error.is_none(), "Request failed: {:?}", world.last_error);
}

#[then(expr = "the request fails with a/an {word} error")]
async fn request_fails(world: &mut LedgerWorld, kind: String) {
    let err = world.last_error.as_ref().expect("Request should have failed");
    assert_eq!(err.kind(), error_kind(&kind), "Unexpected error: {err}");
}

#[then(expr = "{int} withdrawal(s) succeeded and {int} failed with a/an {word} error")]
async fn withdrawal_tally(world: &mut LedgerWorld, succeeded: usize, failed: usize, kind: String) {
    assert_eq!(world.successes, succeeded);
    assert_eq!(world.failures.len(), failed);
    assert!(world.failures.iter().all(|e| e.kind() == error_kind(&kind)));
}

#[then("the tick fails")]
async fn tick_fails(world: &mut LedgerWorld) {
    let result = world.last_tick.as_ref().expect("No tick was run");
    assert!(result.is_err(), "Tick succeeded: {result:?}");
}

#[then(expr = "the tick credits {int} order(s)")]
async fn tick_credits(world: &mut LedgerWorld, count: usize) {
    let result = world.last_tick.as_ref().expect("No tick was run");
    let report = result.as_ref().expect("Tick failed");
    assert_eq!(report.credited, count);
}

fn error_kind(kind: &str) -> ErrorKind {
    match kind {
        "validation" => ErrorKind::Validation,
        "conflict" => ErrorKind::Conflict,
        "insufficient-balance" => ErrorKind::InsufficientBalance,
        "transient" => ErrorKind::Transient,
        "fatal" => ErrorKind::Fatal,
        s => panic!("Unknown error kind: {s}"),
    }
}
