use sqlx::SqliteConnection;

use crate::db_types::{Shipment, ShipmentStatus};

pub async fn insert_shipment(
    order_id: i64,
    seller_id: i64,
    store_id: i64,
    shipping_address_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Shipment, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO shipments (order_id, seller_id, store_id, shipping_address_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(seller_id)
    .bind(store_id)
    .bind(shipping_address_id)
    .bind(ShipmentStatus::Pending)
    .fetch_one(conn)
    .await
}

pub async fn fetch_shipments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Shipment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shipments WHERE order_id = $1 ORDER BY seller_id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// Sets every shipment of the order to `status`. Returns the number of shipments changed.
pub async fn update_status_for_order(
    order_id: i64,
    status: ShipmentStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE shipments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status != $3")
            .bind(status)
            .bind(order_id)
            .bind(status)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}
