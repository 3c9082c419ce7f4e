use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Money;

pub const BASIS_POINTS_PER_UNIT: u32 = 10_000;

/// A platform fee rate, in basis points (1% == 100 bps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeeRate(u32);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("A fee rate of {0} bps is greater than 100%")]
pub struct FeeRateError(u32);

impl FeeRate {
    pub fn new(bps: u32) -> Result<Self, FeeRateError> {
        if bps > BASIS_POINTS_PER_UNIT {
            return Err(FeeRateError(bps));
        }
        Ok(Self(bps))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// The fee owed on `total`, rounded to the nearest minor unit with ties rounded away from zero (half-up).
    pub fn fee_for(&self, total: Money) -> Money {
        let half = i128::from(BASIS_POINTS_PER_UNIT / 2);
        let per_unit = i128::from(BASIS_POINTS_PER_UNIT);
        let product = i128::from(total.value()) * i128::from(self.0);
        let fee = if product >= 0 { (product + half) / per_unit } else { -((-product + half) / per_unit) };
        // |fee| <= |total| since the rate never exceeds 100%
        #[allow(clippy::cast_possible_truncation)]
        Money::from(fee as i64)
    }
}

impl Default for FeeRate {
    /// 10%
    fn default() -> Self {
        Self(1_000)
    }
}

impl TryFrom<u32> for FeeRate {
    type Error = FeeRateError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeRate> for u32 {
    fn from(value: FeeRate) -> Self {
        value.0
    }
}

impl Display for FeeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
