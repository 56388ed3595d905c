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
use chrono::Utc;
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    state::{AppState, RunState, TimerStore},
};
use super::responses::{
    ApiResponse, CreateTimerRequest, HealthResponse, ReorderRequest, StatusResponse, TimerListResponse,
    TimerView,
};

fn status_for(error: &TimerError) -> StatusCode {
    match error {
        TimerError::UnknownTimer(_) => StatusCode::NOT_FOUND,
        TimerError::NonPositiveDuration(_) | TimerError::IndexOutOfRange { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a store operation for `action`, mapping failures to a status code
fn with_store<R>(
    state: &AppState,
    action: &str,
    f: impl FnOnce(&mut TimerStore) -> Result<R, TimerError>,
) -> Result<R, StatusCode> {
    match state.with_store(f) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => {
            warn!("{} failed: {}", action, e);
            Err(status_for(&e))
        }
        Err(e) => {
            error!("{} failed: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /timers - List all timers in order
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerListResponse>, StatusCode> {
    let snapshots = with_store(&state, "list", |store| Ok(store.snapshot(Utc::now())))?;
    Ok(Json(TimerListResponse::new(snapshots)))
}

/// Handle POST /timers - Create a stopped timer at the end of the list
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), StatusCode> {
    let duration = request.duration().map_err(|e| {
        warn!("Rejected new timer {:?}: {}", request.name, e);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    let snapshot = with_store(&state, "create", |store| {
        let identifier = store.add(request.name, duration)?;
        store.get(&identifier, Utc::now())
    })?;

    state.record_action("create");
    info!("Created timer {}", snapshot.identifier);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Timer created", Some(TimerView::from(snapshot)))),
    ))
}

/// Handle GET /timers/:identifier - Return one timer
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<TimerView>, StatusCode> {
    let snapshot = with_store(&state, "get", |store| store.get(&identifier, Utc::now()))?;
    Ok(Json(TimerView::from(snapshot)))
}

/// Handle DELETE /timers/:identifier - Delete a timer and cancel its alert
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    with_store(&state, "delete", |store| store.remove_by_id(&identifier))?;

    state.record_action("delete");
    info!("Deleted timer {}", identifier);
    Ok(Json(ApiResponse::ok("Timer deleted", None)))
}

/// Handle POST /timers/reorder - Move one timer to another position
pub async fn reorder_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<TimerListResponse>, StatusCode> {
    let snapshots = with_store(&state, "reorder", |store| {
        store.reorder(request.from, request.to)?;
        Ok(store.snapshot(Utc::now()))
    })?;

    state.record_action("reorder");
    Ok(Json(TimerListResponse::new(snapshots)))
}

async fn change_run_state(
    state: Arc<AppState>,
    identifier: String,
    requested: RunState,
    action: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    let now = Utc::now();
    let snapshot = with_store(&state, action, |store| {
        store.set_run_state(&identifier, requested, now)?;
        store.get(&identifier, now)
    })?;

    state.record_action(action);
    info!("{} timer {} - now {}", action, identifier, snapshot.state);
    Ok(Json(ApiResponse::ok(
        format!("Timer is now {}", snapshot.state),
        Some(TimerView::from(snapshot)),
    )))
}

/// Handle POST /timers/:identifier/start - Start or resume a timer
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    change_run_state(state, identifier, RunState::Running, "start").await
}

/// Handle POST /timers/:identifier/pause - Pause a running timer
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    change_run_state(state, identifier, RunState::Paused, "pause").await
}

/// Handle POST /timers/:identifier/stop - Stop and reset a timer
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    change_run_state(state, identifier, RunState::Stopped, "stop").await
}

/// Handle GET /events - Stream store events as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(event.kind()).json_data(&event) {
                    Ok(sse_event) => return Some((Ok(sse_event), rx)),
                    Err(e) => warn!("Failed to encode store event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream fell behind, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return a summary of all timers and the server
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let snapshots = with_store(&state, "status", |store| Ok(store.snapshot(Utc::now())))?;
    let count = |wanted: RunState| snapshots.iter().filter(|s| s.state == wanted).count();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timers: snapshots.len(),
        running: count(RunState::Running),
        paused: count(RunState::Paused),
        stopped: count(RunState::Stopped),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
