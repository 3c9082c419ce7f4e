use thiserror::Error;

#[derive(Debug, Error)]
pub enum MomoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send request: {0}")]
    RequestError(String),
    #[error("The aggregator did not respond in time")]
    Timeout,
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Request failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl From<reqwest::Error> for MomoApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MomoApiError::Timeout
        } else if e.is_decode() {
            MomoApiError::JsonError(e.to_string())
        } else {
            MomoApiError::RequestError(e.to_string())
        }
    }
}
