use actix_web::{
    http::{header::ContentType, StatusCode},
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{Order, OrderStatus, UserId},
    AccountApi,
    AccountManagement,
    OrderIntakeApi,
    SqliteDatabase,
};
use serde_json::Value;

use super::helpers::{fresh_database, get_request, issue_token, post_request, tear_down};
use crate::{
    endpoint_tests::mocks::MockAccountManager,
    routes::{MyOrdersRoute, SubmitOrderRoute},
};

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let (status, _) = get_request("", "/api/user/orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/api/user/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_my_orders_when_there_are_none() {
    let token = issue_token("bob");
    let (status, body) = get_request(&token, "/api/user/orders", configure).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn submit_new_order() {
    let db = fresh_database().await;
    let token = issue_token("alice");
    let (status, body) =
        post_request(&token, "/api/user/orders", "12345678903", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["number"], "12345678903");
    assert_eq!(order["status"], "NEW");
    assert!(order.get("accrual").is_none());

    // Submitting it again changes nothing
    let (status, _) =
        post_request(&token, "/api/user/orders", "12345678903", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::OK);
    let orders = db.fetch_orders_for_user(&UserId::from("alice")).await.unwrap();
    assert_eq!(orders.len(), 1);
    tear_down(db).await;
}

#[actix_web::test]
async fn submit_order_as_json() {
    let db = fresh_database().await;
    let token = issue_token("alice");
    let (status, _) = post_request(&token, "/api/user/orders", "79927398713", ContentType::json(), intake(&db)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    tear_down(db).await;
}

#[actix_web::test]
async fn submit_another_users_order() {
    let db = fresh_database().await;
    let (status, _) = post_request(
        &issue_token("alice"),
        "/api/user/orders",
        "12345678903",
        ContentType::plaintext(),
        intake(&db),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, body) =
        post_request(&issue_token("bob"), "/api/user/orders", "12345678903", ContentType::plaintext(), intake(&db))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Order 12345678903 was submitted by another user"), "{body}");
    tear_down(db).await;
}

#[actix_web::test]
async fn submit_invalid_order_numbers() {
    let db = fresh_database().await;
    let token = issue_token("alice");
    let (status, _) =
        post_request(&token, "/api/user/orders", "12345678904", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) =
        post_request(&token, "/api/user/orders", "twelve", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_request(&token, "/api/user/orders", "", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_request("", "/api/user/orders", "12345678903", ContentType::plaintext(), intake(&db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let orders = db.fetch_orders_for_user(&UserId::from("alice")).await.unwrap();
    assert!(orders.is_empty());
    tear_down(db).await;
}

fn intake(db: &SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    let db = db.clone();
    move |cfg| {
        cfg.service(SubmitOrderRoute::<SqliteDatabase>::new()).app_data(web::Data::new(OrderIntakeApi::new(db)));
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_orders_for_user().returning(|user_id| match user_id.as_str() {
        "alice" => Ok(orders_response()),
        _ => Ok(vec![]),
    });
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(MyOrdersRoute::<MockAccountManager>::new()).app_data(web::Data::new(accounts_api));
}

// Mock response to `fetch_orders_for_user` call
fn orders_response() -> Vec<Order> {
    vec![
        Order {
            number: "9278923470".into(),
            status: OrderStatus::Processed,
            user_id: UserId::from("alice"),
            accrual: Some(Points::from(50000)),
            uploaded_at: Utc.with_ymd_and_hms(2020, 12, 10, 15, 15, 45).unwrap(),
        },
        Order {
            number: "12345678903".into(),
            status: OrderStatus::Processing,
            user_id: UserId::from("alice"),
            accrual: None,
            uploaded_at: Utc.with_ymd_and_hms(2020, 12, 10, 15, 12, 1).unwrap(),
        },
        Order {
            number: "346436439".into(),
            status: OrderStatus::Invalid,
            user_id: UserId::from("alice"),
            accrual: None,
            uploaded_at: Utc.with_ymd_and_hms(2020, 12, 9, 16, 9, 53).unwrap(),
        },
    ]
}

const ORDERS_JSON: &str = r#"[{"number":"9278923470","status":"PROCESSED","accrual":500.0,"uploaded_at":"2020-12-10T15:15:45Z"},{"number":"12345678903","status":"PROCESSING","uploaded_at":"2020-12-10T15:12:01Z"},{"number":"346436439","status":"INVALID","uploaded_at":"2020-12-09T16:09:53Z"}]"#;
