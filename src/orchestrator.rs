//! Design generation pipeline
//!
//! One run produces three artifacts, strictly in order:
//! 1. Home description (chat completion)
//! 2. Floor plan (image generation, then download)
//! 3. 3D render (image generation, then download)
//!
//! Each stage is best-effort: its error is recorded in place of the artifact
//! and the next stage still runs. Only one run may be active at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::design::DesignRequest;
use crate::error::GenerationError;
use crate::images::{Bitmap, ImageFetcher};
use crate::openai::OpenAiClient;
use crate::prompts::{build_prompt, ArtifactKind};

/// Orchestrator run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("a design is already being generated")]
    Busy,
}

/// Result set of one run
#[derive(Debug, Clone)]
pub struct DesignOutcome {
    pub id: Uuid,
    pub request: DesignRequest,
    pub generated_at: DateTime<Utc>,
    pub description: Result<String, GenerationError>,
    pub floor_plan: Result<Bitmap, GenerationError>,
    pub render: Result<Bitmap, GenerationError>,
}

impl DesignOutcome {
    /// Number of artifacts that failed
    pub fn failures(&self) -> usize {
        [
            self.description.is_err(),
            self.floor_plan.is_err(),
            self.render.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

/// Sequences prompt building, generation and download for each artifact
pub struct Orchestrator {
    client: OpenAiClient,
    fetcher: ImageFetcher,
    state: Mutex<RunState>,
    latest: RwLock<Option<Arc<DesignOutcome>>>,
}

/// Holds the Running state; returns to Idle on drop
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RunState::Idle;
    }
}

impl Orchestrator {
    /// Create an orchestrator from provider settings
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let client = OpenAiClient::new(config)?;
        let fetcher = ImageFetcher::new(
            Duration::from_secs(config.timeout_secs),
            config.max_image_bytes,
        )?;
        Ok(Self {
            client,
            fetcher,
            state: Mutex::new(RunState::Idle),
            latest: RwLock::new(None),
        })
    }

    /// Create a shared instance
    pub fn shared(config: &ProviderConfig) -> Result<Arc<Self>, GenerationError> {
        Self::new(config).map(Arc::new)
    }

    /// Check if the provider key is configured
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Outcome of the last completed run
    pub fn latest(&self) -> Option<Arc<DesignOutcome>> {
        self.latest.read().clone()
    }

    fn begin(&self) -> Result<RunGuard<'_>, OrchestratorError> {
        let mut state = self.state.lock();
        if *state == RunState::Running {
            return Err(OrchestratorError::Busy);
        }
        *state = RunState::Running;
        Ok(RunGuard { state: &self.state })
    }

    /// Run the full pipeline for one request
    ///
    /// Rejects the trigger with `Busy` if a run is already active. The
    /// previous outcome is discarded as soon as the run starts.
    pub async fn generate(
        &self,
        request: DesignRequest,
    ) -> Result<Arc<DesignOutcome>, OrchestratorError> {
        let _guard = self.begin()?;
        *self.latest.write() = None;

        let id = Uuid::new_v4();
        info!(
            "Generating design {}: {} rooms, {} bathrooms, {} style, budget ${}",
            id,
            request.rooms(),
            request.bathrooms(),
            request.style(),
            request.budget()
        );

        let description = self.describe(&request).await;
        log_stage(id, ArtifactKind::Description, description.as_ref().err());

        let floor_plan = self.draw(ArtifactKind::FloorPlan, &request).await;
        log_stage(id, ArtifactKind::FloorPlan, floor_plan.as_ref().err());

        let render = self.draw(ArtifactKind::Render, &request).await;
        log_stage(id, ArtifactKind::Render, render.as_ref().err());

        let outcome = Arc::new(DesignOutcome {
            id,
            request,
            generated_at: Utc::now(),
            description,
            floor_plan,
            render,
        });

        info!(
            "Design {} complete ({} of 3 artifacts failed)",
            id,
            outcome.failures()
        );

        *self.latest.write() = Some(outcome.clone());
        Ok(outcome)
    }

    async fn describe(&self, request: &DesignRequest) -> Result<String, GenerationError> {
        let prompt = build_prompt(ArtifactKind::Description, request);
        self.client.generate_text(&prompt).await
    }

    async fn draw(
        &self,
        kind: ArtifactKind,
        request: &DesignRequest,
    ) -> Result<Bitmap, GenerationError> {
        let prompt = build_prompt(kind, request);
        let url = self.client.generate_image_url(&prompt).await?;
        self.fetcher.fetch(&url).await
    }
}

fn log_stage(id: Uuid, kind: ArtifactKind, error: Option<&GenerationError>) {
    match error {
        None => info!("Design {}: {} ready", id, kind),
        Some(e) => warn!("Design {}: {} failed: {}", id, kind, e),
    }
}
