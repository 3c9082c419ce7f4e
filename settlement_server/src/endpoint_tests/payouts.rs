use actix_web::{http::StatusCode, test::TestRequest};
use mkt_common::Money;
use serde_json::json;
use settlement_engine::{
    test_utils::{fakes::GatewayBehaviour, fixtures::set_balance},
    traits::LedgerManagement,
    WithdrawalPolicy,
};

use super::helpers::{as_user, TestServer, BUYER};
use crate::config::ServerConfig;

async fn funded_server(config: ServerConfig, balance: i64) -> TestServer {
    let server = TestServer::with_config(config).await;
    let (seller, store) = (&server.market.seller_a, &server.market.store_a);
    set_balance(&server.db, seller.id, store.id, Money::from(balance)).await.expect("Error setting balance");
    server
}

fn payout_request(amount: i64) -> TestRequest {
    as_user(TestRequest::post().uri("/api/payouts"), "seller-a", "seller")
        .set_json(json!({ "amount": amount, "note": "Weekly withdrawal" }))
}

#[actix_web::test]
async fn payout_debits_the_balance() {
    let server = funded_server(ServerConfig::default(), 10_000).await;
    let (status, json) = server.call_json(payout_request(4_000)).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["balance_before"], 10_000);
    assert_eq!(json["balance_after"], 6_000);
    assert_eq!(json["payout"]["status"], "completed");
    assert_eq!(json["payout"]["destination_account"], "+256772100200");
    assert!(json["payout"]["transaction_id"].is_string());

    assert_eq!(server.payout.call_count(), 1);
    let sent = server.payout.last_request().unwrap();
    assert_eq!(sent.amount, Money::from(4_000));
    assert_eq!(sent.seller_id, server.market.seller_a.id);
    assert_eq!(sent.narration, "Weekly withdrawal");

    let req = as_user(TestRequest::get().uri("/api/balance"), "seller-a", "seller");
    let (_, balance) = server.call_json(req).await;
    assert_eq!(balance["balance"], 6_000);

    let req = as_user(TestRequest::get().uri("/api/payouts"), "seller-a", "seller");
    let (status, payouts) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payouts.as_array().unwrap().len(), 1);
    assert_eq!(payouts[0]["amount"], 4_000);

    // Seller B sees none of it
    let req = as_user(TestRequest::get().uri("/api/payouts"), "seller-b", "seller");
    let (_, payouts) = server.call_json(req).await;
    assert!(payouts.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn full_balance_cannot_be_withdrawn_by_default() {
    let server = funded_server(ServerConfig::default(), 10_000).await;
    let (status, json) = server.call_json(payout_request(10_000)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
    assert_eq!(json["category"], "state_conflict");
    assert_eq!(json["error"], "Insufficient escrow balance. Requested 100.00, available 100.00");
    assert_eq!(server.payout.call_count(), 0);
    let payouts = server.db.fetch_payouts_for_seller(server.market.seller_a.id).await.unwrap();
    assert!(payouts.is_empty());
}

#[actix_web::test]
async fn full_balance_withdrawal_when_allowed() {
    let mut config = ServerConfig::default();
    config.policy = config.policy.with_withdrawal_policy(WithdrawalPolicy::AllowFullBalance);
    let server = funded_server(config, 10_000).await;
    let (status, json) = server.call_json(payout_request(10_000)).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["balance_after"], 0);
}

#[actix_web::test]
async fn seller_without_balance() {
    let server = TestServer::new().await;
    let (status, json) = server.call_json(payout_request(100)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
    assert_eq!(server.payout.call_count(), 0);
}

#[actix_web::test]
async fn invalid_amounts() {
    let server = funded_server(ServerConfig::default(), 10_000).await;
    let (status, json) = server.call_json(payout_request(0)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");
    assert_eq!(json["fields"][0]["field"], "amount");
    let (status, _) = server.call_json(payout_request(-500)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(server.payout.call_count(), 0);
}

#[actix_web::test]
async fn rejected_transfer_leaves_balance_untouched() {
    let server = funded_server(ServerConfig::default(), 10_000).await;
    server.payout.set_behaviour(GatewayBehaviour::Reject("Destination wallet is barred".into()));
    let (status, json) = server.call_json(payout_request(2_500)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{json}");
    assert_eq!(json["category"], "upstream");

    let balance = server.db.fetch_seller_balance(server.market.seller_a.id).await.unwrap().unwrap();
    assert_eq!(balance.balance, Money::from(10_000));
    let payouts = server.db.fetch_payouts_for_seller(server.market.seller_a.id).await.unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].status.to_string(), "failed");
}

#[actix_web::test]
async fn unreachable_gateway() {
    let server = funded_server(ServerConfig::default(), 10_000).await;
    server.payout.set_behaviour(GatewayBehaviour::Timeout);
    let (status, _) = server.call_json(payout_request(2_500)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let balance = server.db.fetch_seller_balance(server.market.seller_a.id).await.unwrap().unwrap();
    assert_eq!(balance.balance, Money::from(10_000));
}

#[actix_web::test]
async fn buyers_have_no_payouts() {
    let server = TestServer::new().await;
    let req = as_user(TestRequest::post().uri("/api/payouts"), BUYER, "buyer").set_json(json!({ "amount": 100 }));
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req =
        as_user(TestRequest::post().uri("/api/payouts"), BUYER, "buyer,seller").set_json(json!({ "amount": 100 }));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{json}");
}

#[actix_web::test]
async fn settled_orders_fund_payouts() {
    let server = TestServer::new().await;
    server.paid_order(BUYER).await;
    let req = as_user(TestRequest::get().uri("/api/escrows"), "seller-a", "seller");
    let (status, escrows) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{escrows}");
    assert_eq!(escrows.as_array().unwrap().len(), 1);
    assert_eq!(escrows[0]["seller_amount"], 9_000);
    assert_eq!(escrows[0]["platform_fee"], 1_000);

    let (status, json) = server.call_json(payout_request(8_999)).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["balance_after"], 1);
}
