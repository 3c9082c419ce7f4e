use cucumber::{given, then, when};
use mkt_common::Money;
use settlement_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    objects::{CallbackNotification, CallbackStatus, ChargeInitiation, CheckoutRequest, PayoutRequest},
    test_utils::{
        fakes::GatewayBehaviour,
        fixtures::{sample_address, seed_cart, set_balance},
    },
    LedgerManagement,
};

use crate::cucumber::MarketplaceWorld;

fn money(s: &str) -> Money {
    s.parse().unwrap_or_else(|e| panic!("{s} is not an amount: {e}"))
}

#[given(expr = "buyer '{word}' has {int} of product A and {int} of product B in their cart")]
async fn fill_cart(world: &mut MarketplaceWorld, buyer: String, qty_a: i64, qty_b: i64) {
    let sys = world.system();
    let lines: Vec<(i64, i64)> =
        [(sys.market.product_a, qty_a), (sys.market.product_b, qty_b)].into_iter().filter(|(_, q)| *q > 0).collect();
    seed_cart(&sys.db, &buyer, &lines).await.expect("Error filling cart");
}

#[given(expr = "seller {word} has an escrow balance of {word}")]
async fn seed_balance(world: &mut MarketplaceWorld, seller: String, amount: String) {
    let sys = world.system();
    let (seller, store_id) = sys.seller(&seller);
    set_balance(&sys.db, seller.id, store_id, money(&amount)).await.expect("Error setting balance");
}

#[given(expr = "the charge gateway rejects requests with {string}")]
async fn charge_gateway_rejects(world: &mut MarketplaceWorld, message: String) {
    world.system().charge.set_behaviour(GatewayBehaviour::Reject(message));
}

#[given(expr = "the payout gateway rejects requests with {string}")]
async fn payout_gateway_rejects(world: &mut MarketplaceWorld, message: String) {
    world.system().payout.set_behaviour(GatewayBehaviour::Reject(message));
}

#[when(expr = "buyer '{word}' checks out")]
async fn checkout(world: &mut MarketplaceWorld, buyer: String) {
    let sys = world.system();
    let request = CheckoutRequest {
        address: sample_address(),
        payment_method_id: Some(sys.market.mtn.id),
        payment_option_id: sys.market.pay_now.id,
    };
    let result = sys.checkout_api().checkout(&buyer, request).await;
    if let Some(result) = world.record(result) {
        world.orders.insert(buyer, result.order.id);
    }
}

#[when(expr = "buyer '{word}' pays for their order with {word} number {word}")]
async fn pay(world: &mut MarketplaceWorld, buyer: String, network: String, phone: String) {
    let order_id = world.order_for(&buyer);
    let sys = world.system();
    let method = match network.as_str() {
        "MTN" => sys.market.mtn.id,
        "Airtel" => sys.market.airtel.id,
        _ => panic!("Unknown network {network}"),
    };
    let request = ChargeInitiation {
        order_id,
        payment_option_id: sys.market.pay_now.id,
        payment_method_id: Some(method),
        phone: Some(phone),
    };
    let result = sys.payment_api().initiate_payment(&buyer, request).await;
    if let Some(payment) = world.record(result) {
        world.payments.insert(buyer, payment);
    }
}

#[when(expr = "the gateway reports the payment for buyer '{word}' as {word}")]
async fn callback(world: &mut MarketplaceWorld, buyer: String, status: String) {
    let reference = world.payments.get(&buyer).expect("No payment for buyer").reference.clone();
    let status = match status.as_str() {
        "successful" => CallbackStatus::Successful,
        "failed" => CallbackStatus::Failed,
        _ => panic!("Unknown callback status {status}"),
    };
    let notification = CallbackNotification { reference, status, message: None };
    let result = world.system().callback_api().process_callback(notification).await;
    world.record(result);
}

#[when(expr = "the order for buyer '{word}' is {word} by '{word}'")]
async fn move_order(world: &mut MarketplaceWorld, buyer: String, action: String, actor: String) {
    let order_id = world.order_for(&buyer);
    let api = world.system().flow_api();
    let result = match action.as_str() {
        "shipped" => api.mark_shipped(&actor, order_id, None).await,
        "delivered" => api.mark_delivered(&actor, order_id, None).await,
        "cancelled" => api.cancel_order(&actor, order_id, None).await,
        _ => panic!("Unknown order action {action}"),
    };
    world.record(result);
}

#[when(expr = "seller {word} requests a payout of {word}")]
async fn request_payout(world: &mut MarketplaceWorld, seller: String, amount: String) {
    let sys = world.system();
    let user_id = sys.seller(&seller).0.user_id.clone();
    let request = PayoutRequest { amount: money(&amount), note: None };
    let result = sys.payout_api().request_payout(&user_id, request).await;
    world.record(result);
}

#[then("the last request succeeded")]
async fn last_request_succeeded(world: &mut MarketplaceWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "the last request failed with a {word} error")]
async fn last_request_failed(world: &mut MarketplaceWorld, category: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    assert_eq!(err.category().to_string(), category, "Unexpected error: {err}");
}

#[then(expr = "the order for buyer '{word}' is {word} with a total of {word}")]
async fn check_order(world: &mut MarketplaceWorld, buyer: String, status: String, total: String) {
    let order_id = world.order_for(&buyer);
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("No order");
    assert_eq!(order.status, status.parse::<OrderStatusType>().expect("Invalid status"));
    assert_eq!(order.total, money(&total));
}

#[then(expr = "buyer '{word}' has {int} payment(s) and the latest is {word}")]
async fn check_payments(world: &mut MarketplaceWorld, buyer: String, count: usize, status: String) {
    let order_id = world.order_for(&buyer);
    let payments = world.system().db.fetch_payments_for_order(order_id).await.expect("Error fetching payments");
    assert_eq!(payments.len(), count);
    let expected = match status.as_str() {
        "pending" => PaymentStatus::Pending,
        "successful" => PaymentStatus::Successful,
        "failed" => PaymentStatus::Failed,
        _ => panic!("Unknown payment status {status}"),
    };
    assert_eq!(payments.last().map(|p| p.status), Some(expected));
}

#[then(expr = "seller {word} holds an escrow of {word} with a platform fee of {word} for buyer '{word}'")]
async fn check_escrow(world: &mut MarketplaceWorld, seller: String, total: String, fee: String, buyer: String) {
    let order_id = world.order_for(&buyer);
    let sys = world.system();
    let seller_id = sys.seller(&seller).0.id;
    let escrows = sys.db.fetch_escrows_for_order(order_id).await.expect("Error fetching escrows");
    let escrow = escrows.iter().find(|e| e.seller_id == seller_id).expect("No escrow for seller");
    assert_eq!(escrow.total_amount, money(&total));
    assert_eq!(escrow.platform_fee, money(&fee));
    assert_eq!(escrow.seller_amount + escrow.platform_fee, escrow.total_amount);
}

#[then(expr = "the order for buyer '{word}' has {int} escrows")]
async fn count_escrows(world: &mut MarketplaceWorld, buyer: String, count: usize) {
    let order_id = world.order_for(&buyer);
    let escrows = world.system().db.fetch_escrows_for_order(order_id).await.expect("Error fetching escrows");
    assert_eq!(escrows.len(), count);
}

#[then(expr = "seller {word} has an escrow balance of {word}")]
async fn check_balance(world: &mut MarketplaceWorld, seller: String, amount: String) {
    let sys = world.system();
    let seller_id = sys.seller(&seller).0.id;
    let balance = sys.db.fetch_seller_balance(seller_id).await.expect("Error fetching balance");
    assert_eq!(balance.map(|b| b.balance).unwrap_or_default(), money(&amount));
}

#[then(expr = "seller {word} has {int} payout(s)")]
async fn count_payouts(world: &mut MarketplaceWorld, seller: String, count: usize) {
    let sys = world.system();
    let seller_id = sys.seller(&seller).0.id;
    let payouts = sys.db.fetch_payouts_for_seller(seller_id).await.expect("Error fetching payouts");
    assert_eq!(payouts.len(), count);
}

#[then(expr = "the charge gateway was called {int} time(s)")]
async fn charge_calls(world: &mut MarketplaceWorld, count: usize) {
    assert_eq!(world.system().charge.call_count(), count);
}
