//! Seed data for the collaborator tables that the settlement core reads from.
use mkt_common::Money;

use crate::{
    db_types::{AddressFields, MobileNetwork, PaymentMethod, PaymentOption, PaymentOptionKind, Seller, Store},
    SqliteDatabase,
};

pub async fn seed_seller(
    db: &SqliteDatabase,
    user_id: &str,
    name: &str,
    payout_phone: &str,
) -> Result<(Seller, Store), sqlx::Error> {
    let seller: Seller =
        sqlx::query_as("INSERT INTO sellers (user_id, name, payout_phone) VALUES ($1, $2, $3) RETURNING *")
            .bind(user_id)
            .bind(name)
            .bind(payout_phone)
            .fetch_one(db.pool())
            .await?;
    let store: Store = sqlx::query_as("INSERT INTO stores (seller_id, name) VALUES ($1, $2) RETURNING *")
        .bind(seller.id)
        .bind(format!("{name}'s store"))
        .fetch_one(db.pool())
        .await?;
    Ok((seller, store))
}

pub async fn seed_product(db: &SqliteDatabase, store_id: i64, name: &str, price: Money) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO products (store_id, name, price) VALUES ($1, $2, $3) RETURNING id")
        .bind(store_id)
        .bind(name)
        .bind(price)
        .fetch_one(db.pool())
        .await?;
    Ok(id)
}

pub async fn set_product_price(db: &SqliteDatabase, product_id: i64, price: Money) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET price = $1 WHERE id = $2").bind(price).bind(product_id).execute(db.pool()).await?;
    Ok(())
}

/// Creates (or reuses) the buyer's cart and adds `(product_id, quantity)` lines at the product's current price.
pub async fn seed_cart(db: &SqliteDatabase, buyer_id: &str, lines: &[(i64, i64)]) -> Result<i64, sqlx::Error> {
    let (cart_id,): (i64,) = sqlx::query_as(
        "INSERT INTO carts (buyer_id) VALUES ($1) ON CONFLICT (buyer_id) DO UPDATE SET buyer_id = excluded.buyer_id \
         RETURNING id",
    )
    .bind(buyer_id)
    .fetch_one(db.pool())
    .await?;
    for (product_id, quantity) in lines {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, price) SELECT $1, id, $2, price FROM products \
             WHERE id = $3",
        )
        .bind(cart_id)
        .bind(quantity)
        .bind(product_id)
        .execute(db.pool())
        .await?;
    }
    Ok(cart_id)
}

pub async fn seed_payment_method(
    db: &SqliteDatabase,
    name: &str,
    network: MobileNetwork,
    enabled: bool,
) -> Result<PaymentMethod, sqlx::Error> {
    sqlx::query_as("INSERT INTO payment_methods (name, network, enabled) VALUES ($1, $2, $3) RETURNING *")
        .bind(name)
        .bind(network)
        .bind(enabled)
        .fetch_one(db.pool())
        .await
}

pub async fn seed_payment_option(
    db: &SqliteDatabase,
    name: &str,
    kind: PaymentOptionKind,
) -> Result<PaymentOption, sqlx::Error> {
    sqlx::query_as("INSERT INTO payment_options (name, kind) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(kind)
        .fetch_one(db.pool())
        .await
}

/// Directly sets a seller's escrow balance, for payout tests that don't need to go through checkout first.
pub async fn set_balance(
    db: &SqliteDatabase,
    seller_id: i64,
    store_id: i64,
    balance: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO escrow_balances (seller_id, store_id, balance) VALUES ($1, $2, $3) ON CONFLICT (seller_id, \
         store_id) DO UPDATE SET balance = excluded.balance",
    )
    .bind(seller_id)
    .bind(store_id)
    .bind(balance)
    .execute(db.pool())
    .await?;
    Ok(())
}

pub fn sample_address() -> AddressFields {
    AddressFields {
        recipient_name: "Amina Nakato".into(),
        phone: "+256772000001".into(),
        street: "Plot 12, Kampala Road".into(),
        city: "Kampala".into(),
        region_id: 1,
        notes: None,
    }
}

/// A small marketplace: two sellers with one product each, MTN and Airtel payment methods (plus a disabled one),
/// and the three payment options.
#[derive(Debug, Clone)]
pub struct Marketplace {
    pub seller_a: Seller,
    pub store_a: Store,
    pub seller_b: Seller,
    pub store_b: Store,
    /// 100.00, sold by seller A
    pub product_a: i64,
    /// 25.00, sold by seller B
    pub product_b: i64,
    pub mtn: PaymentMethod,
    pub airtel: PaymentMethod,
    pub disabled: PaymentMethod,
    pub pay_now: PaymentOption,
    pub pay_later: PaymentOption,
    pub request_payment: PaymentOption,
}

pub async fn seed_marketplace(db: &SqliteDatabase) -> Result<Marketplace, sqlx::Error> {
    let (seller_a, store_a) = seed_seller(db, "seller-a", "Akello", "+256772100200").await?;
    let (seller_b, store_b) = seed_seller(db, "seller-b", "Byaruhanga", "+256701300400").await?;
    let product_a = seed_product(db, store_a.id, "Kitenge fabric", Money::from(10_000)).await?;
    let product_b = seed_product(db, store_b.id, "Coffee beans", Money::from(2_500)).await?;
    let mtn = seed_payment_method(db, "MTN Mobile Money", MobileNetwork::Mtn, true).await?;
    let airtel = seed_payment_method(db, "Airtel Money", MobileNetwork::Airtel, true).await?;
    let disabled = seed_payment_method(db, "Legacy wallet", MobileNetwork::Mtn, false).await?;
    let pay_now = seed_payment_option(db, "Pay now", PaymentOptionKind::PayNow).await?;
    let pay_later = seed_payment_option(db, "Pay later", PaymentOptionKind::PayLater).await?;
    let request_payment = seed_payment_option(db, "Request payment", PaymentOptionKind::RequestPayment).await?;
    Ok(Marketplace {
        seller_a,
        store_a,
        seller_b,
        store_b,
        product_a,
        product_b,
        mtn,
        airtel,
        disabled,
        pay_now,
        pay_later,
        request_payment,
    })
}
