use std::time::Duration;

use actix_web::{dev::Server, error, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use momo_tools::MomoApi;
use settlement_engine::{
    traits::{ChargeGateway, PayoutGateway},
    CallbackApi,
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    PaymentApi,
    PayoutApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::momo::{MomoChargeGateway, MomoPayoutGateway},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        CancelOrderRoute,
        CheckoutRoute,
        DeliverOrderRoute,
        InitiateChargeRoute,
        MomoCallbackRoute,
        MyBalanceRoute,
        MyEscrowsRoute,
        MyPayoutsRoute,
        OrderDetailsRoute,
        PaymentStatusRoute,
        RequestPayoutRoute,
        RequestRefundRoute,
        SellerBalanceRoute,
        ShipOrderRoute,
        StoreBalanceRoute,
    },
};

pub const CALLBACK_SIGNATURE_HEADER: &str = "x-momo-signature";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let momo = MomoApi::new(config.momo.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Using mobile-money aggregator {momo:?}");
    let charge_gateway = MomoChargeGateway::new(momo.clone());
    let payout_gateway = MomoPayoutGateway::new(momo);
    let srv = create_server_instance(config, db, charge_gateway, payout_gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<G, P>(
    config: ServerConfig,
    db: SqliteDatabase,
    charge_gateway: G,
    payout_gateway: P,
) -> Result<Server, ServerError>
where
    G: ChargeGateway + Send + 'static,
    P: PayoutGateway + Send + 'static,
{
    let bind_to = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .configure(|cfg| configure_app(cfg, &config, db.clone(), charge_gateway.clone(), payout_gateway.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_to)?
    .run();
    Ok(srv)
}

/// Registers the settlement APIs and every route on an application. The gateways are generic so that tests can run
/// the real routing against scripted gateways.
pub fn configure_app<G, P>(
    cfg: &mut web::ServiceConfig,
    config: &ServerConfig,
    db: SqliteDatabase,
    charge_gateway: G,
    payout_gateway: P,
) where
    G: ChargeGateway + 'static,
    P: PayoutGateway + 'static,
{
    let policy = config.policy.clone();
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        error::Error::from(ServerError::InvalidRequestBody(err.to_string()))
    });
    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request path. {err}");
        error::Error::from(ServerError::InvalidRequestPath(err.to_string()))
    });
    let callback_scope = web::scope("/callbacks")
        .wrap(HmacMiddlewareFactory::new(
            CALLBACK_SIGNATURE_HEADER,
            config.callback.hmac_secret.clone(),
            config.callback.hmac_checks,
        ))
        .service(MomoCallbackRoute::<SqliteDatabase>::new());
    let api_scope = web::scope("/api")
        .service(CheckoutRoute::<SqliteDatabase>::new())
        .service(InitiateChargeRoute::<SqliteDatabase, G>::new())
        .service(PaymentStatusRoute::<SqliteDatabase>::new())
        .service(MyBalanceRoute::<SqliteDatabase>::new())
        .service(StoreBalanceRoute::<SqliteDatabase>::new())
        .service(SellerBalanceRoute::<SqliteDatabase>::new())
        .service(MyEscrowsRoute::<SqliteDatabase>::new())
        .service(MyPayoutsRoute::<SqliteDatabase>::new())
        .service(RequestPayoutRoute::<SqliteDatabase, P>::new())
        .service(OrderDetailsRoute::<SqliteDatabase>::new())
        .service(CancelOrderRoute::<SqliteDatabase>::new())
        .service(RequestRefundRoute::<SqliteDatabase>::new())
        .service(ShipOrderRoute::<SqliteDatabase>::new())
        .service(DeliverOrderRoute::<SqliteDatabase>::new());
    cfg.app_data(json_config)
        .app_data(path_config)
        .app_data(web::Data::new(config.identity.clone()))
        .app_data(web::Data::new(ServerOptions::from_config(config)))
        .app_data(web::Data::new(CheckoutApi::new(db.clone(), policy.clone())))
        .app_data(web::Data::new(PaymentApi::new(db.clone(), charge_gateway, policy.clone())))
        .app_data(web::Data::new(CallbackApi::new(db.clone(), policy.fee_rate)))
        .app_data(web::Data::new(PayoutApi::new(db.clone(), payout_gateway, policy)))
        .app_data(web::Data::new(OrderFlowApi::new(db.clone())))
        .app_data(web::Data::new(LedgerApi::new(db)))
        .service(health)
        .service(callback_scope)
        .service(api_scope);
}
