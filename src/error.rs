use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::series::SeriesError;
use crate::timeconv::TimestampError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("STH API error: {0}")]
    Sth(String),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("Invalid attribute value: {0}")]
    InvalidValue(String),

    #[error("Series error: {0}")]
    Series(#[from] SeriesError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Sth(msg) => {
                tracing::error!("STH API error: {msg}");
                (StatusCode::BAD_GATEWAY, format!("STH API error: {msg}"))
            }
            Self::Timestamp(e) => {
                tracing::error!("Timestamp error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Timestamp conversion failed".to_string(),
                )
            }
            Self::InvalidValue(msg) => {
                tracing::error!("Invalid attribute value: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid attribute value".to_string(),
                )
            }
            Self::Series(e) => {
                tracing::error!("Series error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Series error".to_string(),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
