use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;
use serde_json::Value;
use settlement_engine::{
    test_utils::{
        fakes::{FakeChargeGateway, FakePayoutGateway},
        fixtures::{sample_address, seed_cart, seed_marketplace, Marketplace},
        prepare_env::fresh_database,
    },
    SqliteDatabase,
};

use crate::{
    auth::{ROLES_HEADER, USER_ID_HEADER},
    config::ServerConfig,
    server::configure_app,
};

pub const BUYER: &str = "buyer-1";
pub const BUYER_PHONE: &str = "+256772000001";
pub const ADMIN: &str = "ops-1";

/// A real ledger behind the real routes, with scripted gateways in place of the aggregator.
pub struct TestServer {
    pub db: SqliteDatabase,
    pub market: Marketplace,
    pub charge: FakeChargeGateway,
    pub payout: FakePayoutGateway,
    pub config: ServerConfig,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let _ = env_logger::try_init().ok();
        let db = fresh_database(5).await;
        let market = seed_marketplace(&db).await.expect("Error seeding marketplace");
        Self { db, market, charge: FakeChargeGateway::accepting(), payout: FakePayoutGateway::accepting(), config }
    }

    fn configure(&self, cfg: &mut ServiceConfig) {
        configure_app(cfg, &self.config, self.db.clone(), self.charge.clone(), self.payout.clone());
    }

    pub async fn call(&self, req: TestRequest) -> (StatusCode, String) {
        call_app(|cfg| self.configure(cfg), req).await
    }

    pub async fn call_json(&self, req: TestRequest) -> (StatusCode, Value) {
        let (status, body) = self.call(req).await;
        let json = serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body));
        (status, json)
    }

    pub async fn fill_cart(&self, buyer: &str) {
        seed_cart(&self.db, buyer, &[(self.market.product_a, 1), (self.market.product_b, 2)])
            .await
            .expect("Error seeding cart");
    }

    pub fn checkout_body(&self) -> Value {
        serde_json::json!({
            "address": sample_address(),
            "payment_method_id": self.market.mtn.id,
            "payment_option_id": self.market.pay_now.id,
        })
    }

    pub fn charge_body(&self, order_id: i64) -> Value {
        serde_json::json!({
            "order_id": order_id,
            "payment_option_id": self.market.pay_now.id,
            "payment_method_id": self.market.mtn.id,
            "phone": BUYER_PHONE,
        })
    }

    /// Checks out a fresh cart as `buyer` over HTTP. Returns the order id.
    pub async fn place_order(&self, buyer: &str) -> i64 {
        self.fill_cart(buyer).await;
        let req = as_user(TestRequest::post().uri("/api/checkout"), buyer, "buyer").set_json(self.checkout_body());
        let (status, json) = self.call_json(req).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["order"]["id"].as_i64().expect("order id")
    }

    /// Starts a charge for the order over HTTP. Returns the payment's correlation reference.
    pub async fn charge(&self, buyer: &str, order_id: i64) -> String {
        let req = as_user(TestRequest::post().uri("/api/payments/charge"), buyer, "buyer")
            .set_json(self.charge_body(order_id));
        let (status, json) = self.call_json(req).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{json}");
        json["reference"].as_str().expect("payment reference").to_string()
    }

    pub async fn callback(&self, reference: &str, status: &str) -> (StatusCode, Value) {
        let req = TestRequest::post()
            .uri("/callbacks/momo")
            .set_json(serde_json::json!({ "reference": reference, "status": status }));
        self.call_json(req).await
    }

    /// Checkout, charge and a successful callback. Returns the order id.
    pub async fn paid_order(&self, buyer: &str) -> i64 {
        let order_id = self.place_order(buyer).await;
        let reference = self.charge(buyer, order_id).await;
        let (status, json) = self.callback(&reference, "SUCCESSFUL").await;
        assert_eq!(status, StatusCode::OK, "{json}");
        order_id
    }
}

/// Sends the request to an app built by `configure` and returns the status and body, whether the response came from
/// a handler or a middleware refused the request.
pub async fn call_app<F>(configure: F, req: TestRequest) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn as_user(req: TestRequest, user_id: &str, roles: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id.to_string())).insert_header((ROLES_HEADER, roles.to_string()))
}
