use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewPayment, Order, OrderStatusType, PaymentMethod, PaymentOptionKind, PaymentStatus},
    helpers::{new_payment_reference, MobileNumber, PhoneError},
    settlement_api::{
        errors::SettlementError,
        objects::{ChargeInitiation, PaymentInitiated},
        policy::SettlementPolicy,
    },
    traits::{ChargeGateway, ChargeRequest, SettlementDatabase},
};

/// `PaymentApi` orchestrates charge initiation: it checks that the order can be paid, validates the chosen method,
/// option and phone number, calls the charge gateway and records the attempt.
pub struct PaymentApi<B, G> {
    db: B,
    gateway: G,
    policy: SettlementPolicy,
}

impl<B, G> Debug for PaymentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, G> PaymentApi<B, G> {
    pub fn new(db: B, gateway: G, policy: SettlementPolicy) -> Self {
        Self { db, gateway, policy }
    }
}

impl<B, G> PaymentApi<B, G>
where
    B: SettlementDatabase,
    G: ChargeGateway,
{
    /// Initiates a charge for `request.order_id` on behalf of `buyer_id`.
    ///
    /// Only the `pay_now` option is supported. It calls the gateway once, and the attempt is stored whatever the
    /// outcome: `pending` with the correlation reference if the gateway accepted it, `failed` with the gateway's
    /// message otherwise. Nothing is stored when the request is rejected before the gateway is called, which includes
    /// an order that already has a `pending` charge awaiting its callback.
    pub async fn initiate_payment(
        &self,
        buyer_id: &str,
        request: ChargeInitiation,
    ) -> Result<PaymentInitiated, SettlementError> {
        let order = self.payable_order(buyer_id, request.order_id).await?;
        let option = self
            .db
            .fetch_payment_option(request.payment_option_id)
            .await?
            .ok_or(SettlementError::PaymentOptionNotFound(request.payment_option_id))?;
        let method = match (option.kind.requires_payment_method(), request.payment_method_id) {
            (true, None) => {
                return Err(SettlementError::invalid_field(
                    "payment_method_id",
                    format!("is required for the {} option", option.kind),
                ))
            },
            (_, Some(id)) => Some(self.enabled_method(id).await?),
            (false, None) => None,
        };
        let phone = match (&request.phone, &method) {
            (Some(phone), Some(method)) => Some(self.resolve_phone(phone, method)?),
            (None, _) if option.kind == PaymentOptionKind::PayNow => {
                return Err(SettlementError::invalid_field("phone", "is required to pay now"));
            },
            _ => None,
        };
        match (option.kind, method, phone) {
            (PaymentOptionKind::PayNow, Some(method), Some(phone)) => {
                self.pay_now(buyer_id, &order, option.id, &method, phone).await
            },
            (kind, _, _) => {
                info!("💳️ Order {} requested the {kind} option, which is not available yet", order.id);
                Err(SettlementError::NotImplemented(format!("The {kind} payment option")))
            },
        }
    }

    async fn payable_order(&self, buyer_id: &str, order_id: i64) -> Result<Order, SettlementError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.buyer_id == buyer_id)
            .ok_or(SettlementError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            debug!("💳️ Order {order_id} is {} and cannot be charged", order.status);
            return Err(SettlementError::OrderNotPayable { order_id, status: order.status });
        }
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        if let Some(pending) = payments.into_iter().find(|p| p.status == PaymentStatus::Pending) {
            debug!("💳️ Order {order_id} already has charge {} awaiting its callback", pending.reference);
            return Err(SettlementError::ChargeInProgress { order_id, reference: pending.reference });
        }
        Ok(order)
    }

    async fn enabled_method(&self, method_id: i64) -> Result<PaymentMethod, SettlementError> {
        let method =
            self.db.fetch_payment_method(method_id).await?.ok_or(SettlementError::PaymentMethodNotFound(method_id))?;
        if !method.enabled {
            return Err(SettlementError::PaymentMethodDisabled(method_id));
        }
        Ok(method)
    }

    fn resolve_phone(&self, phone: &str, method: &PaymentMethod) -> Result<MobileNumber, SettlementError> {
        let number = self.policy.phone.parse(phone).map_err(|e| match e {
            PhoneError::InvalidFormat { .. } | PhoneError::UnsupportedNetwork(_) => {
                SettlementError::invalid_field("phone", e.to_string())
            },
            PhoneError::InvalidPrefixConfig(s) => SettlementError::LedgerInvariant(s),
        })?;
        if number.network != method.network {
            return Err(SettlementError::NetworkMismatch {
                expected: method.network.to_string(),
                found: number.network.to_string(),
            });
        }
        Ok(number)
    }

    async fn pay_now(
        &self,
        buyer_id: &str,
        order: &Order,
        option_id: i64,
        method: &PaymentMethod,
        phone: MobileNumber,
    ) -> Result<PaymentInitiated, SettlementError> {
        let reference = new_payment_reference();
        let charge = ChargeRequest {
            reference: reference.clone(),
            msisdn: phone.msisdn().to_string(),
            network: phone.network,
            amount: order.total,
            description: format!("Payment for order {}", order.reference),
        };
        debug!("💳️ Requesting charge {reference} of {} on {} for order {}", order.total, phone.network, order.id);
        let outcome = self.gateway.initiate_charge(charge).await;
        let mut payment = NewPayment {
            order_id: order.id,
            user_id: buyer_id.to_string(),
            amount: order.total,
            payment_method_id: Some(method.id),
            payment_option_id: option_id,
            phone: Some(phone.e164.clone()),
            reference,
            gateway_reference: None,
            status: PaymentStatus::Pending,
            notes: None,
        };
        match outcome {
            Ok(accepted) => {
                payment.gateway_reference = accepted.gateway_reference;
                payment.notes = accepted.message;
                let payment = self.db.insert_payment(payment).await?;
                info!(
                    "💳️ Charge {} for order {} accepted by the gateway. Awaiting callback",
                    payment.reference, order.id
                );
                Ok(payment.into())
            },
            Err(e) => {
                let message = e.to_string();
                payment.status = PaymentStatus::Failed;
                payment.notes = Some(message.clone());
                let payment = self.db.insert_payment(payment).await?;
                warn!("💳️ Charge {} for order {} failed: {message}", payment.reference, order.id);
                Err(SettlementError::GatewayRejected { record_id: payment.id, message })
            },
        }
    }
}
