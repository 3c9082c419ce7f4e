use std::sync::{Arc, Mutex};

use chrono::Duration;
use log::*;
use reqwest::{header::HeaderValue, Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MomoConfig,
    data_objects::{AccessToken, CollectionRequest, DisbursementRequest, TransactionResponse},
    helpers::request_id,
    MomoApiError,
};

const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Clone)]
pub struct MomoApi {
    config: MomoConfig,
    client: Arc<Client>,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl std::fmt::Debug for MomoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MomoApi ({})", self.config.base_url)
    }
}

impl MomoApi {
    pub fn new(config: MomoConfig) -> Result<Self, MomoApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MomoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(Mutex::new(None)) })
    }

    pub fn config(&self) -> &MomoConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Exchanges the client credentials for a bearer token.
    pub async fn authenticate(&self) -> Result<AccessToken, MomoApiError> {
        let url = self.url("/oauth/token");
        debug!("Authenticating with the aggregator at {url}");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.client_id, Some(self.config.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MomoApiError::Authentication(format!("{status}. {message}")));
        }
        let token = response.json::<AccessToken>().await.map_err(|e| MomoApiError::JsonError(e.to_string()))?;
        info!("Authenticated with the aggregator. Token valid for {}s", token.expires_in);
        Ok(token)
    }

    async fn bearer_token(&self) -> Result<String, MomoApiError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        let cached = self
            .token
            .lock()
            .map_err(|_| MomoApiError::Authentication("Token cache is poisoned".into()))?
            .as_ref()
            .filter(|t| t.is_fresh(margin))
            .map(|t| t.access_token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }
        let token = self.authenticate().await?;
        let bearer = token.access_token.clone();
        if let Ok(mut cache) = self.token.lock() {
            *cache = Some(token);
        }
        Ok(bearer)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MomoApiError> {
        let url = self.url(path);
        let token = self.bearer_token().await?;
        let request_id = request_id();
        trace!("Sending REST query: {url} [{request_id}]");
        let mut req = self.client.request(method, url).bearer_auth(token);
        let id_header =
            HeaderValue::from_str(&request_id).map_err(|e| MomoApiError::Initialization(e.to_string()))?;
        req = req.header("X-Request-Id", id_header);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MomoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MomoApiError::ResponseError(e.to_string()))?;
            if status == 401 {
                // Force a fresh token on the next call
                if let Ok(mut cache) = self.token.lock() {
                    *cache = None;
                }
            }
            Err(MomoApiError::QueryError { status, message })
        }
    }

    /// Asks the aggregator to prompt the buyer's handset. The response is normally `pending`.
    pub async fn collect(&self, request: CollectionRequest) -> Result<TransactionResponse, MomoApiError> {
        debug!(
            "Requesting collection {} of {} {} from {}",
            request.reference, request.amount, request.currency, request.msisdn
        );
        let response = self.rest_query::<TransactionResponse, _>(Method::POST, "/collections", Some(&request)).await?;
        info!("Collection {} is {:?}", request.reference, response.status);
        Ok(response)
    }

    /// Sends money to a wallet. The aggregator settles disbursements synchronously.
    pub async fn disburse(&self, request: DisbursementRequest) -> Result<TransactionResponse, MomoApiError> {
        debug!(
            "Requesting disbursement {} of {} {} to {}",
            request.reference, request.amount, request.currency, request.msisdn
        );
        let response =
            self.rest_query::<TransactionResponse, _>(Method::POST, "/disbursements", Some(&request)).await?;
        info!("Disbursement {} is {:?}", request.reference, response.status);
        Ok(response)
    }
}
