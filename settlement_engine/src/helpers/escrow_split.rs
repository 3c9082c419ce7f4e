//! Splitting a paid order into per-seller escrow amounts.
use std::collections::BTreeMap;

use mkt_common::{FeeRate, Money};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::SellerOrderLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSplit {
    pub store_id: i64,
    pub total: Money,
    pub seller_amount: Money,
    pub platform_fee: Money,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("Line total overflowed for order item {0}")]
    Overflow(i64),
    #[error("Seller {seller_id} has order lines in more than one store ({first} and {second})")]
    MultipleStores { seller_id: i64, first: i64, second: i64 },
    #[error("Order item {0} has a non-positive quantity")]
    InvalidQuantity(i64),
}

/// Groups `lines` by seller and computes the escrow split for each group.
///
/// The fee is rounded half-up to the minor unit and `seller_amount` is always `total - fee`, so
/// `seller_amount + platform_fee == total` holds exactly for every seller. The result is keyed by seller id in
/// ascending order, so the same input always yields the same output.
pub fn split(lines: &[SellerOrderLine], fee_rate: FeeRate) -> Result<BTreeMap<i64, SellerSplit>, SplitError> {
    let mut totals: BTreeMap<i64, (i64, Money)> = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(SplitError::InvalidQuantity(line.order_item_id));
        }
        let line_total = line.price.checked_mul_qty(line.quantity).ok_or(SplitError::Overflow(line.order_item_id))?;
        let entry = totals.entry(line.seller_id).or_insert((line.store_id, Money::ZERO));
        if entry.0 != line.store_id {
            return Err(SplitError::MultipleStores { seller_id: line.seller_id, first: entry.0, second: line.store_id });
        }
        entry.1 = entry.1.checked_add(line_total).ok_or(SplitError::Overflow(line.order_item_id))?;
    }
    let result = totals
        .into_iter()
        .map(|(seller_id, (store_id, total))| {
            let platform_fee = fee_rate.fee_for(total);
            let seller_amount = total - platform_fee;
            (seller_id, SellerSplit { store_id, total, seller_amount, platform_fee })
        })
        .collect();
    Ok(result)
}
