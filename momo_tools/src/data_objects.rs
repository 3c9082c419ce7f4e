use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(skip, default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is still usable, leaving `margin` for the request to complete.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.issued_at + Duration::seconds(self.expires_in) - margin > Utc::now()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionRequest {
    /// Our correlation reference. The aggregator echoes it back in the callback.
    pub reference: String,
    /// International format without the leading `+`
    pub msisdn: String,
    /// `MTN` or `AIRTEL`
    pub network: String,
    pub amount: String,
    pub currency: String,
    pub account: String,
    pub narration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisbursementRequest {
    pub reference: String,
    pub msisdn: String,
    pub network: String,
    pub amount: String,
    pub currency: String,
    pub account: String,
    pub narration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    #[serde(alias = "PENDING", alias = "processing", alias = "PROCESSING")]
    Pending,
    #[serde(alias = "SUCCESSFUL", alias = "success", alias = "SUCCESS", alias = "completed")]
    Successful,
    #[serde(alias = "FAILED", alias = "failure", alias = "rejected", alias = "REJECTED")]
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    pub status: TransactionState,
    pub reference: String,
    /// The aggregator's own transaction id
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The body the aggregator posts to the collection callback URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub reference: String,
    pub status: TransactionState,
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
