//! Design endpoints
//!
//! POST /api/designs        - Generate a design (blocks until all three artifacts are done)
//! GET  /api/designs/latest - Last generated design

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use super::AppState;
use crate::design::{DesignForm, DesignRequest};
use crate::error::{ErrorView, GenerationError};
use crate::images::Bitmap;
use crate::orchestrator::{DesignOutcome, OrchestratorError, RunState};
use crate::prompts::ArtifactKind;

/// Build the designs router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/designs", post(create_design))
        .route("/api/designs/latest", get(latest_design))
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// No design available, with the reason
#[derive(Debug, Serialize)]
pub struct NoDesignResponse {
    pub error: &'static str,
    pub state: RunState,
}

/// One artifact as shown to the page: the payload or the error in its place
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactView<T> {
    Ok(T),
    Error(ErrorView),
}

impl<T> ArtifactView<T> {
    fn from_result<S>(
        result: &Result<S, GenerationError>,
        render: impl FnOnce(&S) -> Result<T, GenerationError>,
    ) -> Self {
        match result.as_ref().map_err(|e| e.clone()).and_then(render) {
            Ok(view) => ArtifactView::Ok(view),
            Err(e) => ArtifactView::Error(ErrorView::from(&e)),
        }
    }
}

/// Displayable image
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub caption: &'static str,
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
}

impl ImageView {
    fn render(kind: ArtifactKind, bitmap: &Bitmap) -> Result<Self, GenerationError> {
        Ok(Self {
            caption: kind.caption(),
            width: bitmap.width(),
            height: bitmap.height(),
            data_uri: bitmap.to_data_uri()?,
        })
    }
}

/// Full design as shown to the page
#[derive(Debug, Serialize)]
pub struct DesignView {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub request: DesignRequest,
    pub description: ArtifactView<String>,
    pub floor_plan: ArtifactView<ImageView>,
    pub render: ArtifactView<ImageView>,
}

impl From<&DesignOutcome> for DesignView {
    fn from(outcome: &DesignOutcome) -> Self {
        Self {
            id: outcome.id,
            generated_at: outcome.generated_at,
            request: outcome.request,
            description: ArtifactView::from_result(&outcome.description, |text| Ok(text.clone())),
            floor_plan: ArtifactView::from_result(&outcome.floor_plan, |b| {
                ImageView::render(ArtifactKind::FloorPlan, b)
            }),
            render: ArtifactView::from_result(&outcome.render, |b| {
                ImageView::render(ArtifactKind::Render, b)
            }),
        }
    }
}

/// Generate a design
///
/// The run is spawned so that a client disconnect does not abort it midway.
async fn create_design(
    State(state): State<AppState>,
    form: Result<Json<DesignForm>, JsonRejection>,
) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let request = form.snapshot();
    let orchestrator = state.orchestrator.clone();
    let run = tokio::spawn(async move { orchestrator.generate(request).await });

    match run.await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(DesignView::from(outcome.as_ref()))).into_response(),
        Ok(Err(e @ OrchestratorError::Busy)) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => {
            error!("Design run task failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "design generation failed".to_string(),
            )
        }
    }
}

/// Last generated design
///
/// 404 while a run is in progress or before the first run; the body's
/// `state` tells the two apart.
async fn latest_design(State(state): State<AppState>) -> Response {
    if let Some(outcome) = state.orchestrator.latest() {
        return Json(DesignView::from(outcome.as_ref())).into_response();
    }

    let run_state = state.orchestrator.state();
    let error = match run_state {
        RunState::Running => "design generation in progress",
        RunState::Idle => "no design generated yet",
    };
    (
        StatusCode::NOT_FOUND,
        Json(NoDesignResponse {
            error,
            state: run_state,
        }),
    )
        .into_response()
}
