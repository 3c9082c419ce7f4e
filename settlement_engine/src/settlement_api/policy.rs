use mkt_common::{FeeRate, Money};
use serde::{Deserialize, Serialize};

use crate::helpers::PhonePolicy;

pub const DEFAULT_SHIPPING_COST: Money = Money::from_minor(5_000);

/// How the payout precheck compares the requested amount with the seller's escrow balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalPolicy {
    /// The balance must be strictly greater than the requested amount, so the full balance can never be withdrawn.
    #[default]
    StrictlyLessThanBalance,
    /// Withdrawing the exact balance is allowed.
    AllowFullBalance,
}

impl WithdrawalPolicy {
    pub fn permits(&self, balance: Money, requested: Money) -> bool {
        match self {
            WithdrawalPolicy::StrictlyLessThanBalance => balance > requested,
            WithdrawalPolicy::AllowFullBalance => balance >= requested,
        }
    }
}

/// Business rules handed to the settlement APIs by whoever constructs them. The engine never reads these from the
/// environment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    pub fee_rate: FeeRate,
    pub shipping_cost: Money,
    pub withdrawal_policy: WithdrawalPolicy,
    pub phone: PhonePolicy,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            fee_rate: FeeRate::default(),
            shipping_cost: DEFAULT_SHIPPING_COST,
            withdrawal_policy: WithdrawalPolicy::default(),
            phone: PhonePolicy::default(),
        }
    }
}

impl SettlementPolicy {
    pub fn with_fee_rate(mut self, fee_rate: FeeRate) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    pub fn with_shipping_cost(mut self, shipping_cost: Money) -> Self {
        self.shipping_cost = shipping_cost;
        self
    }

    pub fn with_withdrawal_policy(mut self, policy: WithdrawalPolicy) -> Self {
        self.withdrawal_policy = policy;
        self
    }

    pub fn with_phone_policy(mut self, phone: PhonePolicy) -> Self {
        self.phone = phone;
        self
    }
}
