use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid {key} value: {reason}")]
    Misconfigured { key: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(#[from] serde_json::Error),

    #[error("Relay error: {0}")]
    Relay(#[from] reqwest::Error),
}

impl AppError {
    fn public_message(&self) -> &'static str {
        match self {
            AppError::UserNotFound => "User not found",
            AppError::MalformedPayload(_) => "Malformed payload",
            AppError::Relay(_) => "An error occurred while processing your chat request.",
            AppError::Misconfigured { .. }
            | AppError::Database(_)
            | AppError::CorruptRecord(_) => "Server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Misconfigured { .. }
            | AppError::Database(_)
            | AppError::CorruptRecord(_)
            | AppError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("{self}");
        }

        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
