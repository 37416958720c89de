use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{Balance, UserId, Withdrawal},
    AccountApi,
    LedgerError,
};

use super::helpers::{expired_token, get_request, get_request_with_auth_header, issue_token};
use crate::{
    endpoint_tests::mocks::MockAccountManager,
    routes::{MyBalanceRoute, MyWithdrawalsRoute},
};

#[actix_web::test]
async fn fetch_balance_no_token() {
    let (status, body) = get_request("", "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        r#"{"error":"Authentication Error. No access token was provided. Use the Authorization header with a Bearer token."}"#
    );
}

#[actix_web::test]
async fn fetch_balance_expired_token() {
    let token = expired_token("alice");
    let (status, body) = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("ExpiredSignature"), "{body}");
}

#[actix_web::test]
async fn fetch_balance_invalid_signature() {
    let mut token = issue_token("alice");
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, _) = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_balance_not_a_bearer_token() {
    let (status, body) = get_request_with_auth_header("Basic YWxpY2U6aHVudGVyMg==", "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Expected a Bearer token"), "{body}");
}

#[actix_web::test]
async fn fetch_my_balance() {
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current":500.5,"withdrawn":42.0}"#);
}

#[actix_web::test]
async fn fetch_balance_for_new_user() {
    let token = issue_token("bob");
    let (status, body) = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current":0.0,"withdrawn":0.0}"#);
}

#[actix_web::test]
async fn storage_failures_are_server_errors() {
    let token = issue_token("carol");
    let (status, body) = get_request(&token, "/api/user/balance", configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Storage is temporarily unavailable. database is locked"}"#);
}

#[actix_web::test]
async fn fetch_my_withdrawals() {
    let token = issue_token("alice");
    let (status, body) = get_request(&token, "/api/user/withdrawals", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"order":"2377225624","sum":500.0,"processed_at":"2024-06-01T10:15:00Z"}]"#);
}

#[actix_web::test]
async fn fetch_withdrawals_when_there_are_none() {
    let token = issue_token("bob");
    let (status, body) = get_request(&token, "/api/user/withdrawals", configure).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

fn configure(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_balance().returning(|user_id| match user_id.as_str() {
        "alice" => Ok(Balance {
            user_id: user_id.clone(),
            current: Points::from(50050),
            withdrawn: Points::from_points(42),
        }),
        "carol" => Err(LedgerError::TransientStorage("database is locked".into())),
        _ => Ok(Balance::empty(user_id.clone())),
    });
    account_manager.expect_fetch_withdrawals_for_user().returning(|user_id| match user_id.as_str() {
        "alice" => Ok(vec![Withdrawal {
            order_number: "2377225624".into(),
            user_id: UserId::from("alice"),
            sum: Points::from_points(500),
            processed_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 15, 0).unwrap(),
        }]),
        _ => Ok(vec![]),
    });
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(MyBalanceRoute::<MockAccountManager>::new())
        .service(MyWithdrawalsRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(accounts_api));
}
