use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use settlement_engine::{
    test_utils::fakes::GatewayBehaviour,
    traits::LedgerManagement,
};

use super::helpers::{as_user, TestServer, ADMIN, BUYER};

#[actix_web::test]
async fn checkout_creates_pending_order() {
    let server = TestServer::new().await;
    server.fill_cart(BUYER).await;
    let req = as_user(TestRequest::post().uri("/api/checkout"), BUYER, "buyer").set_json(server.checkout_body());
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["order"]["status"], "pending");
    assert_eq!(json["order"]["buyer_id"], BUYER);
    // 100.00 + 2 x 25.00 + 50.00 shipping
    assert_eq!(json["order"]["subtotal"], 15_000);
    assert_eq!(json["order"]["total"], 20_000);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["address"]["city"], "Kampala");
}

#[actix_web::test]
async fn checkout_with_empty_cart() {
    let server = TestServer::new().await;
    let req = as_user(TestRequest::post().uri("/api/checkout"), BUYER, "buyer").set_json(server.checkout_body());
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");
    assert_eq!(json["category"], "validation");
    assert_eq!(json["fields"][0]["field"], "cart");
}

#[actix_web::test]
async fn checkout_reports_every_invalid_field() {
    let server = TestServer::new().await;
    server.fill_cart(BUYER).await;
    let mut body = server.checkout_body();
    body["address"]["city"] = json!("");
    body["address"]["region_id"] = json!(0);
    body["payment_option_id"] = json!(999);
    let req = as_user(TestRequest::post().uri("/api/checkout"), BUYER, "buyer").set_json(body);
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");
    let fields = json["fields"].as_array().unwrap().iter().map(|f| f["field"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(fields, vec!["address.city", "address.region_id", "payment_option_id"]);
}

#[actix_web::test]
async fn malformed_checkout_body() {
    let server = TestServer::new().await;
    let req = as_user(TestRequest::post().uri("/api/checkout"), BUYER, "buyer").set_json(json!({"address": 5}));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
    assert_eq!(json["category"], "bad_request");
}

#[actix_web::test]
async fn charge_is_sent_to_the_gateway() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let reference = server.charge(BUYER, order_id).await;
    assert_eq!(server.charge.call_count(), 1);
    let request = server.charge.last_request().unwrap();
    assert_eq!(request.reference, reference);
    assert_eq!(request.amount, mkt_common::Money::from(20_000));

    let req = as_user(TestRequest::get().uri(&format!("/api/payments/{reference}")), BUYER, "buyer");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "pending");

    // Someone else's payment looks like it does not exist
    let req = as_user(TestRequest::get().uri(&format!("/api/payments/{reference}")), "buyer-2", "buyer");
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn charge_with_mismatched_network() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let mut body = server.charge_body(order_id);
    body["payment_method_id"] = json!(server.market.airtel.id);
    let req = as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(body);
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");
    assert_eq!(json["fields"][0]["field"], "phone");
    assert_eq!(server.charge.call_count(), 0);
}

#[actix_web::test]
async fn pay_later_is_not_available() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let mut body = server.charge_body(order_id);
    body["payment_option_id"] = json!(server.market.pay_later.id);
    let req = as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(body);
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{json}");
    assert_eq!(json["category"], "unsupported");
}

#[actix_web::test]
async fn rejected_charge_is_recorded() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    server.charge.set_behaviour(GatewayBehaviour::Reject("Insufficient wallet funds".into()));
    let req =
        as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(server.charge_body(order_id));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{json}");
    assert_eq!(json["category"], "upstream");
    let payments = server.db.fetch_payments_for_order(order_id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status.to_string(), "failed");
    let order = server.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status.to_string(), "pending");
}

#[actix_web::test]
async fn successful_callback_settles_the_order() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let reference = server.charge(BUYER, order_id).await;
    let (status, json) = server.callback(&reference, "SUCCESSFUL").await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["message"], "Payment settled");

    let req = as_user(TestRequest::get().uri(&format!("/api/orders/{order_id}")), BUYER, "buyer");
    let (status, details) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{details}");
    assert_eq!(details["order"]["status"], "paid");
    assert_eq!(details["payments"][0]["status"], "successful");
    let escrows = details["escrows"].as_array().unwrap();
    assert_eq!(escrows.len(), 2);
    let fees: i64 = escrows.iter().map(|e| e["platform_fee"].as_i64().unwrap()).sum();
    assert_eq!(fees, 1_500);
    assert_eq!(details["shipments"].as_array().unwrap().len(), 2);

    assert_eq!(balance_of(&server, "seller-a").await, 9_000);
    assert_eq!(balance_of(&server, "seller-b").await, 4_500);
}

#[actix_web::test]
async fn duplicate_callback_changes_nothing() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let reference = server.charge(BUYER, order_id).await;
    let (status, _) = server.callback(&reference, "SUCCESSFUL").await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = server.callback(&reference, "SUCCESSFUL").await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
    assert_eq!(json["category"], "state_conflict");
    let (status, _) = server.callback(&reference, "FAILED").await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(server.db.fetch_escrows_for_order(order_id).await.unwrap().len(), 2);
    assert_eq!(balance_of(&server, "seller-a").await, 9_000);
}

#[actix_web::test]
async fn callback_for_unknown_reference() {
    let server = TestServer::new().await;
    let (status, json) = server.callback("PAY-DOESNOTEXIST", "SUCCESSFUL").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{json}");
    assert_eq!(json["category"], "not_found");
}

#[actix_web::test]
async fn pending_and_failed_callbacks() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let reference = server.charge(BUYER, order_id).await;

    let (status, json) = server.callback(&reference, "PENDING").await;
    assert_eq!(status, StatusCode::ACCEPTED, "{json}");
    let payment = server.db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status.to_string(), "pending");

    let (status, json) = server.callback(&reference, "FAILED").await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["message"], "Payment failure recorded");
    let payment = server.db.fetch_payment_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status.to_string(), "failed");
    let order = server.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status.to_string(), "pending");
    assert!(server.db.fetch_escrows_for_order(order_id).await.unwrap().is_empty());

    // The buyer can try again
    let retry = server.charge(BUYER, order_id).await;
    assert_ne!(retry, reference);
}

#[actix_web::test]
async fn charge_is_refused_while_another_is_pending() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;
    let reference = server.charge(BUYER, order_id).await;
    let req = as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer")
        .set_json(server.charge_body(order_id));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
    assert_eq!(json["category"], "state_conflict");
    assert!(json["error"].as_str().unwrap().contains(&reference));
    assert_eq!(server.charge.call_count(), 1);
    assert_eq!(server.db.fetch_payments_for_order(order_id).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn paid_orders_cannot_be_charged_again() {
    let server = TestServer::new().await;
    let order_id = server.paid_order(BUYER).await;
    let req =
        as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(server.charge_body(order_id));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
    assert_eq!(json["error"], format!("Order {order_id} cannot be paid. Order has already been paid"));
}

#[actix_web::test]
async fn fulfilment_flow() {
    let server = TestServer::new().await;
    let order_id = server.paid_order(BUYER).await;

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/deliver")), ADMIN, "admin");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/ship")), ADMIN, "admin")
        .set_json(json!({ "note": "Collected by courier" }));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["status"], "shipped");
    assert_eq!(json["entry"]["note"], "Collected by courier");
    assert_eq!(json["entry"]["changed_by"], ADMIN);

    let req =
        as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(server.charge_body(order_id));
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/deliver")), ADMIN, "admin");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["status"], "delivered");
    assert_eq!(json["released_escrows"].as_array().unwrap().len(), 2);

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")), BUYER, "buyer");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["status"], "refund_requested");
}

#[actix_web::test]
async fn buyers_only_cancel_their_own_pending_orders() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")), "buyer-2", "buyer");
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")), BUYER, "buyer");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["status"], "cancelled");

    let req =
        as_user(TestRequest::post().uri("/api/payments/charge"), BUYER, "buyer").set_json(server.charge_body(order_id));
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{json}");
}

#[actix_web::test]
async fn order_details_visibility() {
    let server = TestServer::new().await;
    let order_id = server.place_order(BUYER).await;

    let req = as_user(TestRequest::get().uri(&format!("/api/orders/{order_id}")), "buyer-2", "buyer");
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = as_user(TestRequest::get().uri(&format!("/api/orders/{order_id}")), ADMIN, "admin");
    let (status, json) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["buyer_id"], BUYER);
    assert_eq!(json["history"][0]["status"], "pending");

    let req = as_user(TestRequest::get().uri("/api/orders/not-a-number"), ADMIN, "admin");
    let (status, _) = server.call_json(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn balance_of(server: &TestServer, seller: &str) -> i64 {
    let req = as_user(TestRequest::get().uri("/api/balance"), seller, "seller");
    let (status, json): (StatusCode, Value) = server.call_json(req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json["balance"].as_i64().unwrap()
}
