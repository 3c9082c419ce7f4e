//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler that acts on behalf of a user takes a [`Caller`] and passes the caller's id to the settlement API
//! explicitly. Routes declared with `requires [..]` are wrapped in the ACL middleware, which refuses the request
//! before the handler runs if the caller lacks a role.
//!
//! Handlers run on the worker's event loop, so anything slow (database, gateway calls) must be awaited rather than
//! blocking the thread.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use momo_tools::CallbackPayload;
use settlement_engine::{
    objects::{CallbackOutcome, ChargeInitiation, CheckoutRequest, PaymentInitiated, PayoutRequest},
    traits::{ChargeGateway, LedgerManagement, PayoutGateway, SettlementDatabase},
    CallbackApi,
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    PaymentApi,
    PayoutApi,
    SettlementError,
};

use crate::{
    auth::{Caller, Role},
    config::ServerOptions,
    data_objects::{JsonResponse, StatusNote},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::momo::callback_notification,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each bound listed after `impl` becomes one generic parameter of the handler, in the order given.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  --------------------------------------------------
route!(checkout => Post "/checkout" impl SettlementDatabase where requires [Role::Buyer]);
/// Turns the caller's cart into a pending order. Responds with the order, its line items and the shipping address.
pub async fn checkout<B: SettlementDatabase>(
    caller: Caller,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Checkout request from {}", caller.user_id);
    let result = api.checkout(&caller.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(result))
}

//----------------------------------------------   Payments  --------------------------------------------------
route!(initiate_charge => Post "/payments/charge" impl SettlementDatabase, ChargeGateway where requires [Role::Buyer]);
/// Starts a mobile-money charge for one of the caller's orders. A `202 Accepted` means the buyer's handset has been
/// prompted; the outcome arrives later via the gateway callback.
pub async fn initiate_charge<B, G>(
    caller: Caller,
    body: web::Json<ChargeInitiation>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: ChargeGateway,
{
    let request = body.into_inner();
    debug!("💻️ Charge request from {} for order {}", caller.user_id, request.order_id);
    let payment = api.initiate_payment(&caller.user_id, request).await?;
    Ok(HttpResponse::Accepted().json(payment))
}

route!(payment_status => Get "/payments/{reference}" impl LedgerManagement);
pub async fn payment_status<B: LedgerManagement>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    let payment = api.payment_by_reference(&reference).await?;
    if !caller.is_admin() && payment.user_id != caller.user_id {
        return Err(SettlementError::PaymentNotFound(reference).into());
    }
    Ok(HttpResponse::Ok().json(PaymentInitiated::from(payment)))
}

//----------------------------------------------   Callbacks  -------------------------------------------------
route!(momo_callback => Post "/momo" impl SettlementDatabase);
/// The settlement callback from the mobile-money aggregator.
///
/// Callbacks are idempotent: a second delivery for a payment that has already been settled gets a `409 Conflict` and
/// changes nothing. Interim `pending` notifications are acknowledged and ignored.
pub async fn momo_callback<B: SettlementDatabase>(
    req: HttpRequest,
    body: web::Json<CallbackPayload>,
    api: web::Data<CallbackApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let payload = body.into_inner();
    info!(
        "💻️ Gateway callback for {} ({:?}) from {}",
        payload.reference,
        payload.status,
        peer.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown peer".into())
    );
    let Some(notification) = callback_notification(payload) else {
        return Ok(HttpResponse::Accepted().json(JsonResponse::success("Payment is still pending")));
    };
    let message = match api.process_callback(notification).await? {
        CallbackOutcome::Settled(_) => "Payment settled",
        CallbackOutcome::Failed(_) => "Payment failure recorded",
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Balances  --------------------------------------------------
route!(my_balance => Get "/balance" impl LedgerManagement where requires [Role::Seller]);
pub async fn my_balance<B: LedgerManagement>(
    caller: Caller,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let balance = api.balance_for_user(&caller.user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(store_balance => Get "/stores/{store_id}/balance" impl LedgerManagement where requires [Role::Seller]);
/// The escrow balance of one of the caller's stores. Other sellers' stores look as if they do not exist.
pub async fn store_balance<B: LedgerManagement>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    let seller = api.seller_for_user(&caller.user_id).await?;
    let store = api.store(store_id).await?;
    if store.seller_id != seller.id {
        debug!("💻️ {} asked for the balance of store {store_id}, which is not theirs", caller.user_id);
        return Err(SettlementError::StoreNotFound(store_id).into());
    }
    let balance = api.balance_for_store(store_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(seller_balance => Get "/sellers/{seller_id}/balance" impl LedgerManagement where requires [Role::Admin]);
pub async fn seller_balance<B: LedgerManagement>(
    path: web::Path<i64>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let balance = api.balance_for_seller(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(my_escrows => Get "/escrows" impl LedgerManagement where requires [Role::Seller]);
pub async fn my_escrows<B: LedgerManagement>(
    caller: Caller,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let escrows = api.escrows_for_user(&caller.user_id).await?;
    Ok(HttpResponse::Ok().json(escrows))
}

//----------------------------------------------   Payouts  ---------------------------------------------------
route!(my_payouts => Get "/payouts" impl LedgerManagement where requires [Role::Seller]);
pub async fn my_payouts<B: LedgerManagement>(
    caller: Caller,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payouts = api.payouts_for_user(&caller.user_id).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

route!(request_payout => Post "/payouts" impl SettlementDatabase, PayoutGateway where requires [Role::Seller]);
/// Withdraws part of the caller's escrow balance to their payout wallet.
pub async fn request_payout<B, P>(
    caller: Caller,
    body: web::Json<PayoutRequest>,
    api: web::Data<PayoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    P: PayoutGateway,
{
    let request = body.into_inner();
    info!("💻️ Payout request from {} for {}", caller.user_id, request.amount);
    let recorded = api.request_payout(&caller.user_id, request).await?;
    Ok(HttpResponse::Ok().json(recorded))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_details => Get "/orders/{order_id}" impl LedgerManagement);
/// Buyers see their own orders. Admins see any order.
pub async fn order_details<B: LedgerManagement>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let owner = (!caller.is_admin()).then_some(caller.user_id.as_str());
    let details = api.order_details(path.into_inner(), owner).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl SettlementDatabase where requires [Role::Buyer]);
pub async fn cancel_order<B: SettlementDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: Option<web::Json<StatusNote>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let note = body.and_then(|b| b.into_inner().note);
    let change = api.cancel_order(&caller.user_id, path.into_inner(), note).await?;
    Ok(HttpResponse::Ok().json(change))
}

route!(request_refund => Post "/orders/{order_id}/refund" impl SettlementDatabase where requires [Role::Buyer]);
pub async fn request_refund<B: SettlementDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: Option<web::Json<StatusNote>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let note = body.and_then(|b| b.into_inner().note);
    let change = api.request_refund(&caller.user_id, path.into_inner(), note).await?;
    Ok(HttpResponse::Ok().json(change))
}

route!(ship_order => Post "/orders/{order_id}/ship" impl SettlementDatabase where requires [Role::Admin]);
pub async fn ship_order<B: SettlementDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: Option<web::Json<StatusNote>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let note = body.and_then(|b| b.into_inner().note);
    let change = api.mark_shipped(&caller.user_id, path.into_inner(), note).await?;
    Ok(HttpResponse::Ok().json(change))
}

route!(deliver_order => Post "/orders/{order_id}/deliver" impl SettlementDatabase where requires [Role::Admin]);
/// Marks the order delivered. The order's escrows are released as part of the same change.
pub async fn deliver_order<B: SettlementDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: Option<web::Json<StatusNote>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let note = body.and_then(|b| b.into_inner().note);
    let change = api.mark_delivered(&caller.user_id, path.into_inner(), note).await?;
    Ok(HttpResponse::Ok().json(change))
}
