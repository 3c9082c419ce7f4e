use std::str::FromStr;

use mkt_common::Money;

use crate::MomoApiError;

/// The aggregator expresses amounts as decimal strings in major units, e.g. `"150.00"`.
pub fn parse_momo_amount(amount: &str) -> Result<Money, MomoApiError> {
    Money::from_str(amount).map_err(|e| MomoApiError::InvalidCurrencyAmount(format!("{amount}. {e}")))
}

pub fn momo_amount(amount: Money) -> String {
    amount.to_string()
}

/// A random idempotency key for a single request to the aggregator.
pub fn request_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
