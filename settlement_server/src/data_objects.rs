use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Optional body for order status transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusNote {
    #[serde(default)]
    pub note: Option<String>,
}
