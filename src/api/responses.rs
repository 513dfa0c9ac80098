//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    error::{AppError, TimerError},
    state::SessionSnapshot,
};

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(message: String, session: SessionSnapshot) -> Self {
        let status = if session.is_running {
            "running"
        } else if session.is_paused {
            "paused"
        } else {
            "stopped"
        };

        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session,
        }
    }
}

/// Status response with server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body; `errors` lists every validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, errors) = match &self {
            AppError::Timer(TimerError::Validation(errors)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, errors.clone())
            }
            AppError::Timer(TimerError::InvalidOperation(_)) => (StatusCode::CONFLICT, Vec::new()),
            AppError::PresetNotFound(_) => (StatusCode::NOT_FOUND, Vec::new()),
            AppError::Store(_) | AppError::Lock(_) => {
                error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
            }
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            errors,
        };
        (code, Json(body)).into_response()
    }
}
