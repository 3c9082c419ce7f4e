mod fee_rate;
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use fee_rate::{FeeRate, FeeRateError, BASIS_POINTS_PER_UNIT};
pub use money::{Money, MoneyConversionError, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;
