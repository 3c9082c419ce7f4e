use std::env;

use log::*;
use mkt_common::{helpers::parse_boolean_flag, FeeRate, Money, Secret};
use momo_tools::MomoConfig;
use settlement_engine::{
    helpers::{
        parse_network_prefixes,
        phone::{DEFAULT_COUNTRY_CODE, DEFAULT_NETWORK_PREFIXES},
        PhonePolicy,
    },
    SettlementPolicy,
    WithdrawalPolicy,
    DEFAULT_SHIPPING_COST,
};

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8460;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Apply the embedded schema migrations when the server starts.
    pub auto_migrate: bool,
    /// Business rules handed to the settlement APIs.
    pub policy: SettlementPolicy,
    pub callback: CallbackConfig,
    pub identity: IdentityConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    pub momo: MomoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: String::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            policy: SettlementPolicy::default(),
            callback: CallbackConfig::default(),
            identity: IdentityConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            momo: MomoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MKT_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let max_connections = env::var("MKT_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid value for MKT_DB_MAX_CONNECTIONS ({s}). {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let auto_migrate = parse_boolean_flag(env::var("MKT_AUTO_MIGRATE").ok(), true);
        let policy = policy_from_env();
        let callback = CallbackConfig::from_env_or_default();
        let identity = IdentityConfig::from_env();
        let use_x_forwarded_for = parse_boolean_flag(env::var("MKT_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MKT_USE_FORWARDED").ok(), false);
        let momo = MomoConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_connections,
            auto_migrate,
            policy,
            callback,
            identity,
            use_x_forwarded_for,
            use_forwarded,
            momo,
        }
    }
}

//-------------------------------------------  Settlement policy  ------------------------------------------------------
fn policy_from_env() -> SettlementPolicy {
    let fee_rate = parse_fee_rate(env::var("MKT_PLATFORM_FEE_BPS").ok());
    let shipping_cost = parse_shipping_cost(env::var("MKT_SHIPPING_COST").ok());
    let full_balance = parse_boolean_flag(env::var("MKT_ALLOW_FULL_BALANCE_WITHDRAWAL").ok(), false);
    let withdrawal_policy =
        if full_balance { WithdrawalPolicy::AllowFullBalance } else { WithdrawalPolicy::StrictlyLessThanBalance };
    if full_balance {
        info!("🪛️ Sellers may withdraw their full escrow balance");
    }
    let phone = parse_phone_policy(env::var("MKT_PHONE_COUNTRY_CODE").ok(), env::var("MKT_NETWORK_PREFIXES").ok());
    let policy = SettlementPolicy { fee_rate, shipping_cost, withdrawal_policy, phone };
    info!(
        "🪛️ Settlement policy: fee {}, shipping {}, withdrawals {:?}",
        policy.fee_rate, policy.shipping_cost, policy.withdrawal_policy
    );
    policy
}

pub fn parse_fee_rate(value: Option<String>) -> FeeRate {
    let Some(s) = value else {
        return FeeRate::default();
    };
    s.trim()
        .parse::<u32>()
        .map_err(|e| e.to_string())
        .and_then(|bps| FeeRate::new(bps).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            warn!("🪛️ Invalid value for MKT_PLATFORM_FEE_BPS ({s}). {e}. Using the default, {}.", FeeRate::default());
            FeeRate::default()
        })
}

pub fn parse_shipping_cost(value: Option<String>) -> Money {
    let Some(s) = value else {
        return DEFAULT_SHIPPING_COST;
    };
    match s.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Money::from(v),
        _ => {
            warn!(
                "🪛️ Invalid value for MKT_SHIPPING_COST ({s}). It must be a non-negative number of minor units. Using \
                 the default, {DEFAULT_SHIPPING_COST}."
            );
            DEFAULT_SHIPPING_COST
        },
    }
}

pub fn parse_phone_policy(country_code: Option<String>, prefixes: Option<String>) -> PhonePolicy {
    let country_code = match country_code.map(|s| s.trim().trim_start_matches('+').to_string()) {
        Some(cc) if !cc.is_empty() && cc.chars().all(|c| c.is_ascii_digit()) => cc,
        Some(cc) => {
            warn!("🪛️ Invalid value for MKT_PHONE_COUNTRY_CODE ({cc}). Using the default, {DEFAULT_COUNTRY_CODE}.");
            DEFAULT_COUNTRY_CODE.to_string()
        },
        None => DEFAULT_COUNTRY_CODE.to_string(),
    };
    let prefixes = prefixes
        .and_then(|s| {
            parse_network_prefixes(&s)
                .map_err(|e| {
                    warn!("🪛️ Invalid value for MKT_NETWORK_PREFIXES ({s}). {e}. Using the default table.");
                })
                .ok()
        })
        .or_else(|| parse_network_prefixes(DEFAULT_NETWORK_PREFIXES).ok())
        .unwrap_or_default();
    PhonePolicy::new(country_code, prefixes)
}

//-------------------------------------------  CallbackConfig  ---------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct CallbackConfig {
    /// If true, gateway callbacks must carry a valid `x-momo-signature` header.
    pub hmac_checks: bool,
    pub hmac_secret: Secret<String>,
}

impl CallbackConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_checks = parse_boolean_flag(env::var("MKT_CALLBACK_HMAC_CHECKS").ok(), false);
        let hmac_secret = env::var("MKT_CALLBACK_HMAC_SECRET").ok().unwrap_or_default();
        if hmac_checks && hmac_secret.is_empty() {
            error!(
                "🪛️ MKT_CALLBACK_HMAC_CHECKS is on, but MKT_CALLBACK_HMAC_SECRET is not set. Every gateway callback \
                 will be rejected."
            );
        }
        if !hmac_checks {
            warn!("🪛️ Callback signature checks are disabled. Anyone who can reach the server can post callbacks.");
        }
        Self { hmac_checks, hmac_secret: Secret::new(hmac_secret) }
    }
}

//-------------------------------------------  IdentityConfig  ---------------------------------------------------------
/// How much the server trusts the identity headers set by the upstream session layer.
#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    /// When present, the identity headers must be signed with this key.
    pub secret: Option<Secret<String>>,
}

impl IdentityConfig {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret: secret.filter(|s| !s.is_empty()).map(Secret::new) }
    }

    pub fn from_env() -> Self {
        let config = Self::new(env::var("MKT_IDENTITY_SECRET").ok());
        if config.secret.is_none() {
            info!("🪛️ MKT_IDENTITY_SECRET is not set. Caller identity headers are trusted without a signature.");
        }
        config
    }
}

/// The subset of configuration that request handlers need.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
