use std::time::Duration;

use log::*;
use mkt_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct MomoConfig {
    /// e.g. `https://api.momo-aggregator.example/v1`
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// The merchant account that collections are paid into and disbursements are drawn from.
    pub account: String,
    pub currency: String,
    pub timeout: Duration,
    /// Where the aggregator should deliver collection callbacks.
    pub callback_url: Option<String>,
}

impl Default for MomoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8480".to_string(),
            client_id: String::default(),
            client_secret: Secret::default(),
            account: String::default(),
            currency: "UGX".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            callback_url: None,
        }
    }
}

impl MomoConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("MKT_MOMO_BASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MOMO_BASE_URL not set, using {} (probably useless default)", defaults.base_url);
            defaults.base_url.clone()
        });
        let client_id = std::env::var("MKT_MOMO_CLIENT_ID").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MOMO_CLIENT_ID not set. Calls to the aggregator will fail to authenticate");
            String::default()
        });
        let client_secret = Secret::new(std::env::var("MKT_MOMO_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MOMO_CLIENT_SECRET not set. Calls to the aggregator will fail to authenticate");
            String::default()
        }));
        let account = std::env::var("MKT_MOMO_ACCOUNT").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MOMO_ACCOUNT not set");
            String::default()
        });
        let currency = std::env::var("MKT_MOMO_CURRENCY").unwrap_or(defaults.currency);
        let timeout = std::env::var("MKT_MOMO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for MKT_MOMO_TIMEOUT_SECS ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let callback_url = std::env::var("MKT_MOMO_CALLBACK_URL").ok();
        if callback_url.is_none() {
            info!("🪛️ MKT_MOMO_CALLBACK_URL not set. The aggregator will use its configured default callback URL.");
        }
        Self { base_url, client_id, client_secret, account, currency, timeout, callback_url }
    }
}
