use std::fmt::Debug;

use log::*;

use crate::{
    db_types::NewOrder,
    settlement_api::{
        errors::{FieldError, SettlementError},
        objects::CheckoutRequest,
        policy::SettlementPolicy,
    },
    traits::{CheckoutResult, SettlementDatabase},
};

/// `CheckoutApi` turns a buyer's cart into a `pending` order.
pub struct CheckoutApi<B> {
    db: B,
    policy: SettlementPolicy,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, policy: SettlementPolicy) -> Self {
        Self { db, policy }
    }
}

impl<B> CheckoutApi<B>
where B: SettlementDatabase
{
    /// Validates the request and, in one transaction, creates the order, its items (at the cart's price snapshot)
    /// and its shipping address, then empties the cart.
    pub async fn checkout(&self, buyer_id: &str, request: CheckoutRequest) -> Result<CheckoutResult, SettlementError> {
        let mut errors = validate_address(&request);
        if buyer_id.trim().is_empty() {
            errors.push(FieldError::new("buyer_id", "is required"));
        }
        if self.db.fetch_payment_option(request.payment_option_id).await?.is_none() {
            errors.push(FieldError::new("payment_option_id", "does not exist"));
        }
        if let Some(method_id) = request.payment_method_id {
            if self.db.fetch_payment_method(method_id).await?.is_none() {
                errors.push(FieldError::new("payment_method_id", "does not exist"));
            }
        }
        if !errors.is_empty() {
            debug!("🛒️ Checkout for {buyer_id} rejected: {} invalid fields", errors.len());
            return Err(SettlementError::Validation(errors));
        }
        let order = NewOrder {
            buyer_id: buyer_id.to_string(),
            address: request.address,
            payment_method_id: request.payment_method_id,
            payment_option_id: request.payment_option_id,
            shipping_cost: self.policy.shipping_cost,
        };
        let result = self.db.checkout(order).await?;
        info!(
            "🛒️ Order {} [{}] created for {buyer_id}. Total {} ({} items)",
            result.order.id,
            result.order.reference,
            result.order.total,
            result.items.len()
        );
        Ok(result)
    }
}

fn validate_address(request: &CheckoutRequest) -> Vec<FieldError> {
    let address = &request.address;
    let mut errors = Vec::new();
    for (field, value) in [
        ("address.recipient_name", &address.recipient_name),
        ("address.phone", &address.phone),
        ("address.street", &address.street),
        ("address.city", &address.city),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::new(field, "is required"));
        }
    }
    if address.region_id <= 0 {
        errors.push(FieldError::new("address.region_id", "must be a valid region"));
    }
    errors
}
