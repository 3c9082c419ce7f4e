use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use settlement_engine::{ErrorCategory, FieldError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    Settlement(#[from] SettlementError),
}

impl ServerError {
    /// The machine-readable error class reported in the response body.
    pub fn category(&self) -> String {
        match self {
            Self::Settlement(e) => e.category().to_string(),
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => "bad_request".into(),
            Self::AuthenticationError(AuthError::InvalidRoles(_)) => "bad_request".into(),
            Self::AuthenticationError(AuthError::InsufficientPermissions(_)) => "forbidden".into(),
            Self::AuthenticationError(_) => "unauthorized".into(),
            _ => ErrorCategory::Internal.to_string(),
        }
    }

    pub fn fields(&self) -> Vec<FieldError> {
        match self {
            Self::Settlement(e) => e.fields(),
            _ => vec![],
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::InvalidRoles(_) => StatusCode::BAD_REQUEST,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::Settlement(e) => match e.category() {
                ErrorCategory::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCategory::StateConflict => StatusCode::CONFLICT,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCategory::Reconciliation => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCategory::Unsupported => StatusCode::NOT_IMPLEMENTED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {status}: {self}");
        }
        // Internal details stay in the logs
        let message = match self {
            Self::Settlement(SettlementError::DatabaseError(_)) => "An internal ledger error occurred".to_string(),
            Self::Settlement(SettlementError::Reconciliation(report)) => format!(
                "The transfer {} was sent, but could not be recorded. It has been flagged for reconciliation.",
                report.payout_reference
            ),
            _ => self.to_string(),
        };
        let body = serde_json::json!({
            "error": message,
            "category": self.category(),
            "fields": self.fields(),
        });
        HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No caller identity was provided. {0}")]
    MissingIdentity(String),
    #[error("The caller identity signature is invalid.")]
    InvalidSignature,
    #[error("Invalid roles header. {0}")]
    InvalidRoles(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}
