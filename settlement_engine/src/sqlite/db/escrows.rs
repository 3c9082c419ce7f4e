use log::*;
use mkt_common::{FeeRate, Money};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Escrow, EscrowBalance, EscrowStatus},
    helpers::SellerSplit,
};

/// Creates the escrow row for one (order, seller) pair in `holding` status.
pub async fn insert_escrow(
    order_id: i64,
    buyer_id: &str,
    seller_id: i64,
    payment_id: i64,
    split: &SellerSplit,
    fee_rate: FeeRate,
    conn: &mut SqliteConnection,
) -> Result<Escrow, sqlx::Error> {
    let escrow: Escrow = sqlx::query_as(
        r#"
            INSERT INTO escrows (
                order_id,
                buyer_id,
                seller_id,
                store_id,
                payment_id,
                total_amount,
                seller_amount,
                platform_fee,
                fee_rate_bps,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(buyer_id)
    .bind(seller_id)
    .bind(split.store_id)
    .bind(payment_id)
    .bind(split.total)
    .bind(split.seller_amount)
    .bind(split.platform_fee)
    .bind(i64::from(fee_rate.basis_points()))
    .bind(EscrowStatus::Holding)
    .fetch_one(conn)
    .await?;
    debug!(
        "🏦️ Escrow {} for order {order_id}, seller {seller_id}: total {}, fee {}, seller amount {}",
        escrow.id, escrow.total_amount, escrow.platform_fee, escrow.seller_amount
    );
    Ok(escrow)
}

/// Adds `amount` to the (seller, store) running balance, creating it if this is the seller's first escrow.
pub async fn credit_balance(
    seller_id: i64,
    store_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<EscrowBalance, sqlx::Error> {
    let balance: EscrowBalance = sqlx::query_as(
        r#"
            INSERT INTO escrow_balances (seller_id, store_id, balance) VALUES ($1, $2, $3)
            ON CONFLICT (seller_id, store_id)
            DO UPDATE SET balance = balance + excluded.balance, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(seller_id)
    .bind(store_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    trace!("🏦️ Escrow balance for seller {seller_id} / store {store_id} credited {amount}. Now {}", balance.balance);
    Ok(balance)
}

/// Subtracts `amount` from the (seller, store) balance if and only if the balance covers it. Returns `None` when it
/// does not, in which case nothing was changed.
///
/// The conditional update takes the database write lock, so concurrent debits are serialised and the second one sees
/// the first one's result.
pub async fn debit_balance(
    seller_id: i64,
    store_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<EscrowBalance>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE escrow_balances
            SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
            WHERE seller_id = $2 AND store_id = $3 AND balance >= $4
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(seller_id)
    .bind(store_id)
    .bind(amount)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_balance_for_seller(
    seller_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EscrowBalance>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM escrow_balances WHERE seller_id = $1").bind(seller_id).fetch_optional(conn).await
}

pub async fn fetch_balance_for_store(
    store_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EscrowBalance>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM escrow_balances WHERE store_id = $1").bind(store_id).fetch_optional(conn).await
}

pub async fn fetch_escrows_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Escrow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM escrows WHERE order_id = $1 ORDER BY seller_id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_escrows_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Escrow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM escrows WHERE seller_id = $1 ORDER BY id ASC").bind(seller_id).fetch_all(conn).await
}

/// Moves every `holding` escrow of the order to `released`. Balances are not touched.
pub async fn release_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Escrow>, sqlx::Error> {
    let released: Vec<Escrow> = sqlx::query_as(
        r#"
            UPDATE escrows SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(EscrowStatus::Released)
    .bind(order_id)
    .bind(EscrowStatus::Holding)
    .fetch_all(conn)
    .await?;
    debug!("🏦️ {} escrows released for order {order_id}", released.len());
    Ok(released)
}
