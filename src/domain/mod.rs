//! Domain entities for sitewright.
//!
//! This module contains the core business entities:
//! - Project: identity and lifecycle of one design
//! - Workflow: pipeline steps and the gating stepper
//! - Artifacts: sitemap tree, per-page wireframes, style guide
//! - Generation: per-kind generation lifecycle state
//! - History: bounded undo/redo log
//! - Diagnostics: step-tagged errors and warnings

mod diagnostics;
mod generation;
mod history;
mod project;
mod sitemap;
mod style;
mod validation;
mod wireframe;
mod workflow;

pub use diagnostics::{BuilderError, BuilderWarning, DiagnosticCode, DiagnosticsRegistry, Severity};
pub use generation::{
    ArtifactKind, GenerationState, GenerationStates, GenerationStatus,
    PROGRESS_RESPONSE_RECEIVED,
};
pub use history::{HistoryAction, HistoryEntry, HistoryLog, DEFAULT_MAX_ENTRIES};
pub use project::{Project, ProjectId, ProjectStatus, ProjectUpdate, WebsiteType};
pub use sitemap::{ChangeFrequency, Page, PageUpdate, SitemapStructure};
pub use style::{is_hex_color, ColorToken, StyleGuide, StyleGuideUpdate, TypeScale, Typography};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport};
pub use wireframe::{
    check_orphans, ComponentKind, LayoutKind, Wireframe, WireframeComponent, WireframeMap,
    WireframeUpdate,
};
pub use workflow::{Stepper, WorkflowStep};

use serde::{Deserialize, Serialize};

/// Every generated artifact of a session, captured together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub sitemap: Option<SitemapStructure>,
    #[serde(default)]
    pub wireframes: WireframeMap,
    pub style_guide: Option<StyleGuide>,
}

impl ArtifactSet {
    pub fn is_empty(&self) -> bool {
        self.sitemap.is_none() && self.wireframes.is_empty() && self.style_guide.is_none()
    }
}
