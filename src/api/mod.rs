//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and the request and
//! response structures they exchange.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_handler).post(create_handler))
        .route("/timers/reorder", post(reorder_handler))
        .route("/timers/:identifier", get(get_handler).delete(delete_handler))
        .route("/timers/:identifier/start", post(start_handler))
        .route("/timers/:identifier/pause", post(pause_handler))
        .route("/timers/:identifier/stop", post(stop_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
