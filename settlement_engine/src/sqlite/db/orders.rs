use log::*;
use mkt_common::Money;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{
    AddressFields,
    CartLine,
    Order,
    OrderItem,
    OrderStatusEntry,
    OrderStatusType,
    SellerOrderLine,
    ShippingAddress,
};

/// Inserts a new `pending` order. This is not atomic on its own. Embed the call in a transaction along with the
/// items, address and first history entry.
pub async fn insert_order(
    reference: &str,
    buyer_id: &str,
    subtotal: Money,
    shipping_cost: Money,
    payment_method_id: Option<i64>,
    payment_option_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                reference,
                buyer_id,
                subtotal,
                shipping_cost,
                total,
                status,
                payment_method_id,
                payment_option_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(buyer_id)
    .bind(subtotal)
    .bind(shipping_cost)
    .bind(subtotal + shipping_cost)
    .bind(OrderStatusType::Pending)
    .bind(payment_method_id)
    .bind(payment_option_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} [{}] inserted for buyer {buyer_id}", order.id, order.reference);
    Ok(order)
}

/// Copies a cart line into the order, keeping the cart's price snapshot.
pub async fn insert_order_item(
    order_id: i64,
    line: &CartLine,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.price)
    .fetch_one(conn)
    .await
}

pub async fn insert_shipping_address(
    order_id: i64,
    address: &AddressFields,
    conn: &mut SqliteConnection,
) -> Result<ShippingAddress, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO shipping_addresses (order_id, recipient_name, phone, street, city, region_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(&address.recipient_name)
    .bind(&address.phone)
    .bind(&address.street)
    .bind(&address.city)
    .bind(address.region_id)
    .bind(&address.notes)
    .fetch_one(conn)
    .await
}

/// Appends an entry to the order's audit trail. History rows are never updated or deleted.
pub async fn append_status_history(
    order_id: i64,
    status: OrderStatusType,
    changed_by: Option<&str>,
    note: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        "INSERT INTO order_status_history (order_id, status, changed_by, note) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id)
    .bind(status)
    .bind(changed_by)
    .bind(note)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order {order_id} history: {status}");
    Ok(entry)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC").bind(order_id).fetch_all(conn).await
}

/// The order's items, each tagged with the seller and store that own the product.
pub async fn fetch_seller_lines(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SellerOrderLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT
                oi.id AS order_item_id,
                st.seller_id AS seller_id,
                p.store_id AS store_id,
                oi.quantity AS quantity,
                oi.price AS price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN stores st ON st.id = p.store_id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn fetch_order_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_shipping_address(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ShippingAddress>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shipping_addresses WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Sets the order status to `new_status`, but only if the current status is one of `from`. Returns `None` if the order
/// does not exist or is not in one of the `from` states.
pub async fn update_status_if(
    id: i64,
    from: &[OrderStatusType],
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = ");
    builder.push_bind(new_status);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    builder.push(") RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}
