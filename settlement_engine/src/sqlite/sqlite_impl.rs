//! `SqliteDatabase` is the concrete settlement backend.
//!
//! It implements [`SettlementDatabase`] and [`LedgerManagement`] on top of the low-level functions in [`super::db`],
//! opening one transaction per mutating operation.
use std::fmt::Debug;

use log::*;
use mkt_common::{FeeRate, Money};
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{catalog, escrows, new_pool, orders, payments, payouts, shipments};
use crate::{
    db_types::{
        Escrow,
        EscrowBalance,
        NewOrder,
        NewPayment,
        NewPayout,
        Order,
        OrderItem,
        OrderStatusEntry,
        OrderStatusType,
        Payment,
        PaymentMethod,
        PaymentOption,
        PaymentStatus,
        Payout,
        PayoutStatus,
        Seller,
        Shipment,
        ShipmentStatus,
        ShippingAddress,
        Store,
    },
    helpers::{new_order_reference, split},
    traits::{CheckoutResult, LedgerManagement, RecordedPayout, SettledPayment, SettlementDatabase, StatusChange},
    ReconciliationReport,
    SettlementError,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using the `MKT_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = super::db::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn checkout(&self, order: NewOrder) -> Result<CheckoutResult, SettlementError> {
        let NewOrder { buyer_id, address, payment_method_id, payment_option_id, shipping_cost } = order;
        let mut tx = self.pool.begin().await?;
        let cart_id = catalog::fetch_cart_id(&buyer_id, &mut tx).await?;
        let lines = match cart_id {
            Some(id) => catalog::fetch_cart_lines(id, &mut tx).await?,
            None => vec![],
        };
        let cart_id = match cart_id {
            Some(id) if !lines.is_empty() => id,
            _ => return Err(SettlementError::EmptyCart(buyer_id)),
        };
        let mut subtotal = Money::ZERO;
        for line in &lines {
            subtotal = line
                .price
                .checked_mul_qty(line.quantity)
                .and_then(|t| subtotal.checked_add(t))
                .ok_or_else(|| SettlementError::invalid_field("cart", "Cart total is too large"))?;
        }
        subtotal
            .checked_add(shipping_cost)
            .ok_or_else(|| SettlementError::invalid_field("cart", "Cart total is too large"))?;
        let reference = new_order_reference();
        let order = orders::insert_order(
            &reference,
            &buyer_id,
            subtotal,
            shipping_cost,
            payment_method_id,
            payment_option_id,
            &mut tx,
        )
        .await?;
        let placed_by = Some(buyer_id.as_str());
        orders::append_status_history(order.id, OrderStatusType::Pending, placed_by, Some("Order placed"), &mut tx)
            .await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(orders::insert_order_item(order.id, line, &mut tx).await?);
        }
        let address = orders::insert_shipping_address(order.id, &address, &mut tx).await?;
        catalog::delete_cart(cart_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Checkout for {buyer_id} created order {} with {} items. Cart {cart_id} emptied",
            order.id,
            items.len()
        );
        Ok(CheckoutResult { order, items, address })
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::insert_payment(payment, &mut conn).await?;
        Ok(payment)
    }

    async fn settle_payment(&self, reference: &str, fee_rate: FeeRate) -> Result<SettledPayment, SettlementError> {
        let mut tx = self.pool.begin().await?;
        // The guard must be the first statement so that it takes the write lock before anything is read.
        let payment = match payments::resolve_pending(reference, PaymentStatus::Successful, None, &mut tx).await? {
            Some(p) => p,
            None => {
                let existing = payments::fetch_payment_by_reference(reference, &mut tx).await?;
                return Err(match existing {
                    Some(p) => SettlementError::PaymentAlreadyProcessed { reference: p.reference, status: p.status },
                    None => SettlementError::PaymentNotFound(reference.to_string()),
                });
            },
        };
        trace!("🗃️ Payment {reference} marked successful inside settlement transaction");
        let order_id = payment.order_id;
        let order = orders::update_status_if(order_id, &[OrderStatusType::Pending], OrderStatusType::Paid, &mut tx)
            .await?;
        let order = match order {
            Some(o) => o,
            None => {
                let status = orders::fetch_order(order_id, &mut tx)
                    .await?
                    .map(|o| o.status)
                    .ok_or(SettlementError::OrderNotFound(order_id))?;
                warn!(
                    "🗃️ Payment {reference} settled against order {order_id}, which is already {status}. Rolling back; \
                     the payment stays pending for manual reconciliation."
                );
                return Err(SettlementError::OrderNotPayable { order_id, status });
            },
        };
        let note = format!("Payment {reference} settled");
        orders::append_status_history(order_id, OrderStatusType::Paid, None, Some(&note), &mut tx).await?;
        let address = orders::fetch_shipping_address(order_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::LedgerInvariant(format!("Order {order_id} has no shipping address")))?;
        let lines = orders::fetch_seller_lines(order_id, &mut tx).await?;
        if lines.is_empty() {
            return Err(SettlementError::LedgerInvariant(format!("Order {order_id} has no items")));
        }
        let splits = split(&lines, fee_rate).map_err(|e| SettlementError::LedgerInvariant(e.to_string()))?;
        let mut escrow_rows = Vec::with_capacity(splits.len());
        let mut shipment_rows = Vec::with_capacity(splits.len());
        for (seller_id, seller_split) in &splits {
            let buyer_id = order.buyer_id.as_str();
            let escrow =
                escrows::insert_escrow(order_id, buyer_id, *seller_id, payment.id, seller_split, fee_rate, &mut tx)
                    .await?;
            escrows::credit_balance(*seller_id, seller_split.store_id, seller_split.seller_amount, &mut tx).await?;
            let shipment =
                shipments::insert_shipment(order_id, *seller_id, seller_split.store_id, address.id, &mut tx).await?;
            escrow_rows.push(escrow);
            shipment_rows.push(shipment);
        }
        tx.commit().await?;
        debug!(
            "🗃️ Payment {reference} settled. Order {order_id} is paid with {} escrows and {} shipments",
            escrow_rows.len(),
            shipment_rows.len()
        );
        Ok(SettledPayment { payment, order, escrows: escrow_rows, shipments: shipment_rows })
    }

    async fn fail_payment(&self, reference: &str, reason: &str) -> Result<Payment, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let payment = match payments::resolve_pending(reference, PaymentStatus::Failed, Some(reason), &mut tx).await? {
            Some(p) => p,
            None => {
                let existing = payments::fetch_payment_by_reference(reference, &mut tx).await?;
                return Err(match existing {
                    Some(p) => SettlementError::PaymentAlreadyProcessed { reference: p.reference, status: p.status },
                    None => SettlementError::PaymentNotFound(reference.to_string()),
                });
            },
        };
        tx.commit().await?;
        debug!("🗃️ Payment {reference} marked as failed: {reason}");
        Ok(payment)
    }

    async fn record_payout(&self, payout: NewPayout) -> Result<RecordedPayout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let payout = payouts::insert_payout(payout, &mut tx).await?;
        if payout.status != PayoutStatus::Completed {
            let balance = escrows::fetch_balance_for_seller(payout.seller_id, &mut tx)
                .await?
                .map(|b| b.balance)
                .unwrap_or_default();
            tx.commit().await?;
            return Ok(RecordedPayout { payout, balance_before: balance, balance_after: balance });
        }
        match escrows::debit_balance(payout.seller_id, payout.store_id, payout.amount, &mut tx).await? {
            Some(balance) => {
                tx.commit().await?;
                let balance_before = balance.balance + payout.amount;
                debug!(
                    "🗃️ Payout {} debited {} from seller {}. Balance {balance_before} -> {}",
                    payout.id, payout.amount, payout.seller_id, balance.balance
                );
                Ok(RecordedPayout { payout, balance_before, balance_after: balance.balance })
            },
            None => {
                let current = escrows::fetch_balance_for_seller(payout.seller_id, &mut tx)
                    .await?
                    .map(|b| b.balance)
                    .unwrap_or_default();
                // Keep the payout row. The transfer has already happened.
                tx.commit().await?;
                let report = ReconciliationReport {
                    payout_id: Some(payout.id),
                    payout_reference: payout.reference.clone(),
                    gateway_transaction_id: payout.transaction_id.clone(),
                    seller_id: payout.seller_id,
                    store_id: payout.store_id,
                    amount: payout.amount,
                    balance_before: current,
                    balance_after: current,
                };
                Err(SettlementError::Reconciliation(Box::new(report)))
            },
        }
    }

    async fn record_unreconciled_payout(&self, payout: NewPayout) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let payout = payouts::insert_payout(payout, &mut tx).await?;
        tx.commit().await?;
        warn!("🗃️ Payout {} [{}] stored without a ledger debit", payout.id, payout.reference);
        Ok(payout)
    }

    async fn transition_order_status(
        &self,
        order_id: i64,
        to: OrderStatusType,
        changed_by: &str,
        note: Option<String>,
    ) -> Result<StatusChange, SettlementError> {
        let sources = OrderStatusType::valid_sources(to);
        let mut tx = self.pool.begin().await?;
        let order = match orders::update_status_if(order_id, &sources, to, &mut tx).await? {
            Some(o) => o,
            None => {
                let from = orders::fetch_order(order_id, &mut tx)
                    .await?
                    .map(|o| o.status)
                    .ok_or(SettlementError::OrderNotFound(order_id))?;
                return Err(SettlementError::InvalidTransition { order_id, from, to });
            },
        };
        let entry = orders::append_status_history(order_id, to, Some(changed_by), note.as_deref(), &mut tx).await?;
        let released_escrows = match to {
            OrderStatusType::Shipped => {
                shipments::update_status_for_order(order_id, ShipmentStatus::Shipped, &mut tx).await?;
                vec![]
            },
            OrderStatusType::Delivered => {
                shipments::update_status_for_order(order_id, ShipmentStatus::Delivered, &mut tx).await?;
                escrows::release_for_order(order_id, &mut tx).await?
            },
            _ => vec![],
        };
        tx.commit().await?;
        debug!("🗃️ Order {order_id} is now {to} (by {changed_by})");
        Ok(StatusChange { order, entry, released_escrows })
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_items(order_id, &mut conn).await?)
    }

    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusEntry>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_history(order_id, &mut conn).await?)
    }

    async fn fetch_shipping_address(&self, order_id: i64) -> Result<Option<ShippingAddress>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_shipping_address(order_id, &mut conn).await?)
    }

    async fn fetch_shipments_for_order(&self, order_id: i64) -> Result<Vec<Shipment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(shipments::fetch_shipments_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_reference(reference, &mut conn).await?)
    }

    async fn fetch_escrows_for_order(&self, order_id: i64) -> Result<Vec<Escrow>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(escrows::fetch_escrows_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_escrows_for_seller(&self, seller_id: i64) -> Result<Vec<Escrow>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(escrows::fetch_escrows_for_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_payment_method(id, &mut conn).await?)
    }

    async fn fetch_payment_option(&self, id: i64) -> Result<Option<PaymentOption>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_payment_option(id, &mut conn).await?)
    }

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_seller_for_user(&self, user_id: &str) -> Result<Option<Seller>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_seller_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_store(store_id, &mut conn).await?)
    }

    async fn fetch_store_for_seller(&self, seller_id: i64) -> Result<Option<Store>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_store_for_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_seller_balance(&self, seller_id: i64) -> Result<Option<EscrowBalance>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(escrows::fetch_balance_for_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_store_balance(&self, store_id: i64) -> Result<Option<EscrowBalance>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(escrows::fetch_balance_for_store(store_id, &mut conn).await?)
    }

    async fn fetch_payouts_for_seller(&self, seller_id: i64) -> Result<Vec<Payout>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payouts::fetch_payouts_for_seller(seller_id, &mut conn).await?)
    }
}
