//! HTTP API module - design endpoints and the form page

mod designs;

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::orchestrator::{Orchestrator, RunState};
pub use designs::{ArtifactView, DesignView, ImageView};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the API router
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .merge(designs::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Form page
async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        state: state.orchestrator.state(),
        provider_configured: state.orchestrator.is_configured(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state: RunState,
    provider_configured: bool,
}
