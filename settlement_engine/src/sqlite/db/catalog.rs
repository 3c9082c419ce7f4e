//! Reads from the collaborator tables owned by the catalog, store and cart modules.
use sqlx::SqliteConnection;

use crate::db_types::{CartLine, PaymentMethod, PaymentOption, Seller, Store};

/// Returns the id of the buyer's cart, if they have one.
pub async fn fetch_cart_id(buyer_id: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM carts WHERE buyer_id = $1").bind(buyer_id).fetch_optional(conn).await?;
    Ok(id.map(|(id,)| id))
}

pub async fn fetch_cart_lines(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        "SELECT id, cart_id, product_id, quantity, price FROM cart_items WHERE cart_id = $1 ORDER BY id ASC",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Deletes the cart and all its lines.
pub async fn delete_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_payment_method(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentMethod>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_methods WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_payment_option(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentOption>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_options WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_seller(id: i64, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sellers WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_seller_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sellers WHERE user_id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn fetch_store(id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stores WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_store_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stores WHERE seller_id = $1").bind(seller_id).fetch_optional(conn).await
}
