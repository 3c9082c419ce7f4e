use std::collections::HashMap;

use cucumber::World;
use log::*;
use settlement_engine::{
    objects::PaymentInitiated,
    test_utils::{
        fakes::{FakeChargeGateway, FakePayoutGateway},
        fixtures::{seed_marketplace, Marketplace},
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    db_types::Seller,
    CallbackApi,
    CheckoutApi,
    OrderFlowApi,
    PaymentApi,
    PayoutApi,
    SettlementError,
    SettlementPolicy,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketplaceWorld {
    pub system: Option<SettlementSystem>,
    /// Order ids, keyed by buyer
    pub orders: HashMap<String, i64>,
    /// The most recent charge, keyed by buyer
    pub payments: HashMap<String, PaymentInitiated>,
    pub last_error: Option<SettlementError>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub market: Marketplace,
    pub charge: FakeChargeGateway,
    pub payout: FakePayoutGateway,
    pub policy: SettlementPolicy,
}

impl MarketplaceWorld {
    pub fn system(&self) -> &SettlementSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn order_for(&self, buyer: &str) -> i64 {
        *self.orders.get(buyer).unwrap_or_else(|| panic!("{buyer} has not checked out"))
    }

    /// Records the outcome of a step that may legitimately fail, so that a later step can assert on it.
    pub fn record<T>(&mut self, result: Result<T, SettlementError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step produced error: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let market = seed_marketplace(&db).await.expect("Error seeding marketplace");
        Self {
            db_path: url,
            db,
            market,
            charge: FakeChargeGateway::accepting(),
            payout: FakePayoutGateway::accepting(),
            policy: SettlementPolicy::default(),
        }
    }

    /// Seller `A` or `B` from the seeded marketplace.
    pub fn seller(&self, name: &str) -> (&Seller, i64) {
        match name {
            "A" => (&self.market.seller_a, self.market.store_a.id),
            "B" => (&self.market.seller_b, self.market.store_b.id),
            _ => panic!("Unknown seller {name}"),
        }
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
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
