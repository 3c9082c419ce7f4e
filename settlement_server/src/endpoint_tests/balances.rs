use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use mkt_common::Money;
use serde_json::Value;
use settlement_engine::{
    db_types::{EscrowBalance, Seller, Store},
    LedgerApi,
};

use super::helpers::{as_user, call_app};
use crate::{
    endpoint_tests::mocks::MockLedgerStore,
    routes::{MyBalanceRoute, SellerBalanceRoute, StoreBalanceRoute},
};

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller_for_user().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_seller().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_seller_balance().returning(|_| Ok(Some(balance(9_000))));
    let req = as_user(TestRequest::get().uri("/balance"), "seller-a", "seller");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "seller_id": 7, "store_id": 3, "balance": 9000 }));
}

#[actix_web::test]
async fn uncredited_seller_has_zero_balance() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller_for_user().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_seller().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_seller_balance().returning(|_| Ok(None));
    ledger.expect_fetch_store_for_seller().returning(|_| Ok(Some(store(3, 7))));
    let req = as_user(TestRequest::get().uri("/balance"), "seller-a", "seller");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["balance"], 0);
    assert_eq!(json["store_id"], 3);
}

#[actix_web::test]
async fn balance_for_unknown_seller() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller_for_user().returning(|_| Ok(None));
    let req = as_user(TestRequest::get().uri("/balance"), "buyer-9", "seller");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["category"], "not_found");
    assert_eq!(json["error"], "No seller account exists for user buyer-9");
}

#[actix_web::test]
async fn buyers_cannot_see_balances() {
    let _ = env_logger::try_init().ok();
    // No expectations: the ACL must refuse the request before the ledger is touched
    let ledger = MockLedgerStore::new();
    let req = as_user(TestRequest::get().uri("/balance"), "buyer-1", "buyer");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("The seller role is required"), "{body}");
}

#[actix_web::test]
async fn store_balance_for_own_store() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller_for_user().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_store().returning(|id| Ok(Some(store(id, 7))));
    ledger.expect_fetch_store_balance().returning(|_| Ok(Some(balance(4_500))));
    let req = as_user(TestRequest::get().uri("/stores/3/balance"), "seller-a", "seller");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["balance"], 4500);
}

#[actix_web::test]
async fn store_balance_for_someone_elses_store() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller_for_user().returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_store().returning(|id| Ok(Some(store(id, 99))));
    let req = as_user(TestRequest::get().uri("/stores/12/balance"), "seller-a", "seller");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Store 12 does not exist"), "{body}");
}

#[actix_web::test]
async fn admin_fetches_any_seller_balance() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedgerStore::new();
    ledger.expect_fetch_seller().withf(|id| *id == 7).returning(|_| Ok(Some(seller())));
    ledger.expect_fetch_seller_balance().returning(|_| Ok(Some(balance(1_234))));
    let req = as_user(TestRequest::get().uri("/sellers/7/balance"), "ops-1", "admin");
    let (status, body) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["balance"], 1234);

    let ledger = MockLedgerStore::new();
    let req = as_user(TestRequest::get().uri("/sellers/7/balance"), "seller-a", "seller");
    let (status, _) = call_app(configure(ledger), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure(ledger: MockLedgerStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(LedgerApi::new(ledger)))
            .service(MyBalanceRoute::<MockLedgerStore>::new())
            .service(StoreBalanceRoute::<MockLedgerStore>::new())
            .service(SellerBalanceRoute::<MockLedgerStore>::new());
    }
}

fn created() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

fn seller() -> Seller {
    Seller {
        id: 7,
        user_id: "seller-a".into(),
        name: "Akello".into(),
        payout_phone: "+256772100200".into(),
        payout_method: "MTN".into(),
        created_at: created(),
    }
}

fn store(id: i64, seller_id: i64) -> Store {
    Store { id, seller_id, name: "Akello Fabrics".into(), created_at: created() }
}

fn balance(amount: i64) -> EscrowBalance {
    EscrowBalance {
        id: 1,
        seller_id: 7,
        store_id: 3,
        balance: Money::from(amount),
        created_at: created(),
        updated_at: created(),
    }
}
