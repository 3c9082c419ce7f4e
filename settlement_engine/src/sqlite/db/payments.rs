use log::*;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, Payment, PaymentStatus};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                user_id,
                amount,
                payment_method_id,
                payment_option_id,
                phone,
                reference,
                gateway_reference,
                status,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.user_id)
    .bind(payment.amount)
    .bind(payment.payment_method_id)
    .bind(payment.payment_option_id)
    .bind(payment.phone)
    .bind(payment.reference)
    .bind(payment.gateway_reference)
    .bind(payment.status)
    .bind(payment.notes)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Payment {} [{}] for order {} saved as {}",
        payment.id, payment.reference, payment.order_id, payment.status
    );
    Ok(payment)
}

pub async fn fetch_payment_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE reference = $1").bind(reference).fetch_optional(conn).await
}

pub async fn fetch_payments_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id ASC").bind(order_id).fetch_all(conn).await
}

/// Compare-and-set of a payment's status. The update only applies if the payment is currently `pending`, so of two
/// racing transactions at most one gets a row back.
pub async fn resolve_pending(
    reference: &str,
    status: PaymentStatus,
    notes: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = $1, notes = COALESCE($2, notes), updated_at = CURRENT_TIMESTAMP
            WHERE reference = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(notes)
    .bind(reference)
    .bind(PaymentStatus::Pending)
    .fetch_optional(conn)
    .await
}
