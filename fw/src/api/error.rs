//! API error types

use thiserror::Error;

use crate::settings::SettingsError;

/// Errors that can occur while fetching from the Torn API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key is empty. Set one with `fw key set <KEY>`")]
    MissingKey,

    #[error("Settings unavailable: {0}")]
    Settings(#[from] SettingsError),

    #[error("API rejected request (code {code}): {message}")]
    Rejected { code: u32, message: String },

    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Local configuration problem; nothing reached the network
    pub fn is_config(&self) -> bool {
        matches!(self, ApiError::MissingKey | ApiError::Settings(_))
    }

    /// The API answered with an `error` field
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }

    /// The request or its response failed below the API level
    pub fn is_transport(&self) -> bool {
        !self.is_config() && !self.is_rejection()
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        if self.is_config() {
            "config"
        } else if self.is_rejection() {
            "rejection"
        } else {
            "transport"
        }
    }
}
