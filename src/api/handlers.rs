//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{
    error::AppError,
    state::{AppState, ThresholdConfig},
};
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Handle POST /start - Start or resume the timer
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let session = state.start()?;
    info!("Start endpoint called - timer running at {}", session.elapsed_formatted);
    Ok(Json(ApiResponse::new("Timer running".to_string(), session)))
}

/// Handle POST /pause - Pause the timer
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let session = state.pause()?;
    info!("Pause endpoint called - timer paused at {}", session.elapsed_formatted);
    Ok(Json(ApiResponse::new("Timer paused".to_string(), session)))
}

/// Handle POST /reset - Stop the timer and clear its history
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    let session = state.reset()?;
    info!("Reset endpoint called");
    Ok(Json(ApiResponse::new("Timer reset".to_string(), session)))
}

/// Handle PUT /config - Apply an ad-hoc threshold configuration
pub async fn set_config_handler(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ThresholdConfig>,
) -> Result<Json<ApiResponse>, AppError> {
    let session = state.apply_config(config)?;
    Ok(Json(ApiResponse::new(
        format!("Configuration '{}' applied", session.config.name),
        session,
    )))
}

/// Handle PUT /config/:id - Apply a stored preset
pub async fn apply_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    let session = state.apply_preset(&id)?;
    Ok(Json(ApiResponse::new(
        format!("Preset '{}' applied", session.config.name),
        session,
    )))
}

/// Handle GET /status - Return the current timer snapshot
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(StatusResponse {
        session: state.snapshot()?,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /presets - List stored presets
pub async fn list_presets_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ThresholdConfig>> {
    Json(state.presets.list_configs())
}

/// Handle GET /presets/:id - Fetch one preset
pub async fn get_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ThresholdConfig>, AppError> {
    state
        .presets
        .get_config(&id)
        .map(Json)
        .ok_or(AppError::PresetNotFound(id))
}

/// Handle POST /presets - Validate and store a preset
pub async fn save_preset_handler(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ThresholdConfig>,
) -> Result<(StatusCode, Json<ThresholdConfig>), AppError> {
    config.ensure_valid()?;
    state.presets.save_config(config.clone())?;
    info!("Saved preset '{}' ({})", config.name, config.id);
    Ok((StatusCode::CREATED, Json(config)))
}

/// Handle DELETE /presets/:id - Remove a preset
pub async fn delete_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.presets.delete_config(&id)? {
        info!("Deleted preset {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::PresetNotFound(id))
    }
}

/// Handle GET /events - Stream session changes as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let rx = state.subscribe()?;
    info!("Event stream subscriber connected");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .event(event.event_name())
                        .data(event.to_sse_data());
                    return Some((Ok::<_, Infallible>(sse), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream subscriber lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
