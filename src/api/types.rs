//! HTTP API envelope types

use serde::{Deserialize, Serialize};

/// Standard response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: None,
        }
    }

    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }
}

/// Placeholder payload for responses without data
#[derive(Debug, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Default, Deserialize)]
pub struct QuotesQuery {
    #[serde(default)]
    pub symbols: String,
}
