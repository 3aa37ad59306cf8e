use thiserror::Error;

use crate::routes::Route;

/// Client-level error type.
/// Every workflow maps these to a scoped message and, for some, a navigation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Export quota exceeded")]
    QuotaExceeded,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("Resume is not loaded")]
    NotLoaded,
}

impl ClientError {
    /// Where the UI must go when this error surfaces, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            ClientError::Unauthenticated => Some(Route::Login),
            ClientError::NotFound(_) => Some(Route::Dashboard),
            ClientError::QuotaExceeded => Some(Route::Payment),
            _ => None,
        }
    }

    /// The inline message for this error.
    /// Backend-supplied text passes through; transport and decoding failures
    /// fall back to the caller's generic message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            ClientError::Http(e) => {
                tracing::error!("HTTP error: {e}");
                fallback.to_string()
            }
            ClientError::Parse(e) => {
                tracing::error!("Unexpected response body: {e}");
                fallback.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}
