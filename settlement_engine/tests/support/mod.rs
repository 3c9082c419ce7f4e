#![allow(dead_code)]

use settlement_engine::{
    objects::{ChargeInitiation, CheckoutRequest, PaymentInitiated},
    objects::{CallbackNotification, CallbackOutcome, CallbackStatus},
    test_utils::{
        fakes::{FakeChargeGateway, FakePayoutGateway},
        fixtures::{sample_address, seed_cart, seed_marketplace, Marketplace},
        prepare_env::fresh_database,
    },
    traits::{CheckoutResult, SettledPayment},
    CallbackApi,
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    PaymentApi,
    PayoutApi,
    SettlementPolicy,
    SqliteDatabase,
};

pub const BUYER: &str = "buyer-1";
pub const BUYER_PHONE: &str = "+256772000001";

pub struct Harness {
    pub db: SqliteDatabase,
    pub market: Marketplace,
    pub charge: FakeChargeGateway,
    pub payout: FakePayoutGateway,
    pub policy: SettlementPolicy,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_payout_gateway(FakePayoutGateway::accepting()).await
    }

    pub async fn with_payout_gateway(payout: FakePayoutGateway) -> Self {
        let db = fresh_database(5).await;
        let market = seed_marketplace(&db).await.expect("Error seeding marketplace");
        Self { db, market, charge: FakeChargeGateway::accepting(), payout, policy: SettlementPolicy::default() }
    }

    pub fn checkout_api(&self) -> CheckoutApi<SqliteDatabase> {
        CheckoutApi::new(self.db.clone(), self.policy.clone())
    }

    pub fn payment_api(&self) -> PaymentApi<SqliteDatabase, FakeChargeGateway> {
        PaymentApi::new(self.db.clone(), self.charge.clone(), self.policy.clone())
    }

    pub fn callback_api(&self) -> CallbackApi<SqliteDatabase> {
        CallbackApi::new(self.db.clone(), self.policy.fee_rate)
    }

    pub fn payout_api(&self) -> PayoutApi<SqliteDatabase, FakePayoutGateway> {
        PayoutApi::new(self.db.clone(), self.payout.clone(), self.policy.clone())
    }

    pub fn flow_api(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db.clone())
    }

    pub fn ledger_api(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db.clone())
    }

    pub fn checkout_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            address: sample_address(),
            payment_method_id: Some(self.market.mtn.id),
            payment_option_id: self.market.pay_now.id,
        }
    }

    pub fn pay_now(&self, order_id: i64) -> ChargeInitiation {
        ChargeInitiation {
            order_id,
            payment_option_id: self.market.pay_now.id,
            payment_method_id: Some(self.market.mtn.id),
            phone: Some(BUYER_PHONE.to_string()),
        }
    }

    /// One unit of product A (100.00, seller A) and two of product B (2 x 25.00, seller B).
    pub async fn place_order(&self, buyer: &str) -> CheckoutResult {
        seed_cart(&self.db, buyer, &[(self.market.product_a, 1), (self.market.product_b, 2)])
            .await
            .expect("Error seeding cart");
        self.checkout_api().checkout(buyer, self.checkout_request()).await.expect("Checkout failed")
    }

    pub async fn charge(&self, buyer: &str, order_id: i64) -> PaymentInitiated {
        self.payment_api().initiate_payment(buyer, self.pay_now(order_id)).await.expect("Charge initiation failed")
    }

    pub fn success(reference: &str) -> CallbackNotification {
        CallbackNotification { reference: reference.to_string(), status: CallbackStatus::Successful, message: None }
    }

    pub async fn paid_order(&self, buyer: &str) -> (CheckoutResult, SettledPayment) {
        let checkout = self.place_order(buyer).await;
        let payment = self.charge(buyer, checkout.order.id).await;
        let outcome = self.callback_api().process_callback(Self::success(&payment.reference)).await;
        match outcome {
            Ok(CallbackOutcome::Settled(settled)) => (checkout, settled),
            other => panic!("Expected a settled payment, got {other:?}"),
        }
    }
}
