use log::*;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayout, Payout};

pub async fn insert_payout(payout: NewPayout, conn: &mut SqliteConnection) -> Result<Payout, sqlx::Error> {
    let payout: Payout = sqlx::query_as(
        r#"
            INSERT INTO payouts (
                seller_id,
                store_id,
                amount,
                reference,
                transaction_id,
                payment_method,
                destination_account,
                status,
                message,
                note
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(payout.seller_id)
    .bind(payout.store_id)
    .bind(payout.amount)
    .bind(payout.reference)
    .bind(payout.transaction_id)
    .bind(payout.payment_method)
    .bind(payout.destination_account)
    .bind(payout.status)
    .bind(payout.message)
    .bind(payout.note)
    .fetch_one(conn)
    .await?;
    debug!(
        "💸️ Payout {} [{}] of {} for seller {} saved as {}",
        payout.id, payout.reference, payout.amount, payout.seller_id, payout.status
    );
    Ok(payout)
}

pub async fn fetch_payouts_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payout>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payouts WHERE seller_id = $1 ORDER BY id DESC").bind(seller_id).fetch_all(conn).await
}
