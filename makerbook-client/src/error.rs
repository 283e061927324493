use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Text shown when the server rejected a request without saying why.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Calls that run under their own timeout and report expiry separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedOperation {
    Request,
    AiSuggestions,
    AiRecipeDetail,
}

#[derive(Debug, Error)]
pub enum ClientError {
    // HTTP ошибки
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{}", timeout_message(.operation, .after))]
    Timeout {
        operation: TimedOperation,
        after: Duration,
    },

    // Бизнес-логика ошибки
    #[error("Please log in to {0}")]
    AuthRequired(String),

    #[error("{0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    // Ошибки сериализации/десериализации
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ClientError {
    /// Converts a non-2xx response into an error, preferring the server's own message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());

        match status {
            401 => Self::Unauthorized(message),
            404 => Self::NotFound,
            _ => Self::Api { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn timeout_message(operation: &TimedOperation, after: &Duration) -> String {
    match operation {
        TimedOperation::AiRecipeDetail => format!(
            "Generating the detailed recipe took longer than {:?}. Please try again in a moment.",
            after
        ),
        TimedOperation::AiSuggestions => format!(
            "AI suggestions timed out after {:?}. Please try again.",
            after
        ),
        TimedOperation::Request => {
            format!("Request timed out after {:?}", after)
        }
    }
}
