//! Prompt construction
//!
//! Maps a design request to the natural-language prompt sent to the
//! generative provider, one prompt per artifact.

use std::fmt;

use serde::Serialize;

use crate::design::DesignRequest;

/// System role for the description call
pub const SYSTEM_PERSONA: &str = "You are an expert architectural design assistant.";

/// The artifact a prompt is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Text description of the home
    Description,
    /// Architectural floor plan image
    FloorPlan,
    /// Photorealistic 3D render image
    Render,
}

impl ArtifactKind {
    /// Caption shown next to the artifact
    pub fn caption(&self) -> &'static str {
        match self {
            ArtifactKind::Description => "Home description",
            ArtifactKind::FloorPlan => "Architectural floor plan",
            ArtifactKind::Render => "3D model",
        }
    }

    /// File stem used when an artifact is saved to disk
    pub fn file_stem(&self) -> &'static str {
        match self {
            ArtifactKind::Description => "description",
            ArtifactKind::FloorPlan => "floor_plan",
            ArtifactKind::Render => "render",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Build the prompt for one artifact
pub fn build_prompt(kind: ArtifactKind, req: &DesignRequest) -> String {
    match kind {
        ArtifactKind::Description => format!(
            "Generate a precise description of an ideal home with {} rooms, {} bathrooms, {} style, and a budget of ${}.",
            req.rooms(),
            req.bathrooms(),
            req.style(),
            req.budget()
        ),
        ArtifactKind::FloorPlan => format!(
            "Architectural floor plan of a home with {} rooms, {} bathrooms, in {} style.",
            req.rooms(),
            req.bathrooms(),
            req.style()
        ),
        // The plan is referenced in wording only; the render call never
        // receives floor-plan data.
        ArtifactKind::Render => format!(
            "Photorealistic 3D render of a home with {} rooms, {} bathrooms and {} style, based on the previously generated plan.",
            req.rooms(),
            req.bathrooms(),
            req.style()
        ),
    }
}
