//! Per-artifact generation lifecycle state.

use super::WorkflowStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of generated artifact. Each kind has its own coordinator and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Sitemap,
    Wireframe,
    Style,
}

impl ArtifactKind {
    /// The workflow step completed by a successful generation of this kind
    pub fn step(&self) -> WorkflowStep {
        match self {
            Self::Sitemap => WorkflowStep::Sitemap,
            Self::Wireframe => WorkflowStep::Wireframe,
            Self::Style => WorkflowStep::Style,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Wireframe => "wireframe",
            Self::Style => "style",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Success,
    Error,
}

/// Progress marker set once the service has answered, before decoding
pub const PROGRESS_RESPONSE_RECEIVED: u8 = 80;

/// Lifecycle of one artifact kind's generation.
///
/// `progress` reaches 100 only on success. `start_time` is set on entering
/// `Generating`, `end_time` on reaching a terminal status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    pub progress: u8,
    pub message: Option<String>,
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub confidence: Option<f32>,
}

impl GenerationState {
    /// Enter `Generating`, clearing the outcome of any previous run
    pub fn begin(&mut self, message: impl Into<String>) {
        *self = Self {
            status: GenerationStatus::Generating,
            progress: 0,
            message: Some(message.into()),
            start_time: Some(Utc::now()),
            ..Self::default()
        };
    }

    /// Record an intermediate stage marker
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = progress.min(99);
        self.message = Some(message.into());
    }

    pub fn succeed(&mut self, confidence: f32) {
        self.status = GenerationStatus::Success;
        self.progress = 100;
        self.message = Some("Generation complete".to_string());
        self.end_time = Some(Utc::now());
        self.confidence = Some(confidence.clamp(0.0, 1.0));
    }

    /// Enter `Error`. Progress keeps whatever stage was last reached.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = GenerationStatus::Error;
        self.error = Some(error.into());
        self.message = None;
        self.end_time = Some(Utc::now());
    }

    pub fn is_generating(&self) -> bool {
        self.status == GenerationStatus::Generating
    }
}

/// The three independent generation states
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStates {
    pub sitemap: GenerationState,
    pub wireframe: GenerationState,
    pub style: GenerationState,
}

impl GenerationStates {
    pub fn get(&self, kind: ArtifactKind) -> &GenerationState {
        match kind {
            ArtifactKind::Sitemap => &self.sitemap,
            ArtifactKind::Wireframe => &self.wireframe,
            ArtifactKind::Style => &self.style,
        }
    }

    pub fn get_mut(&mut self, kind: ArtifactKind) -> &mut GenerationState {
        match kind {
            ArtifactKind::Sitemap => &mut self.sitemap,
            ArtifactKind::Wireframe => &mut self.wireframe,
            ArtifactKind::Style => &mut self.style,
        }
    }

    /// Back to idle, except kinds with a generation still in flight
    pub fn reset_settled(&mut self) {
        for state in [&mut self.sitemap, &mut self.wireframe, &mut self.style] {
            if !state.is_generating() {
                *state = GenerationState::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_previous_outcome() {
        let mut state = GenerationState::default();
        state.begin("first");
        state.fail("boom");
        assert_eq!(state.status, GenerationStatus::Error);

        state.begin("retry");
        assert!(state.is_generating());
        assert_eq!(state.progress, 0);
        assert!(state.error.is_none());
        assert!(state.confidence.is_none());
        assert!(state.start_time.is_some());
        assert!(state.end_time.is_none());
    }

    #[test]
    fn test_fail_keeps_progress() {
        let mut state = GenerationState::default();
        state.begin("go");
        state.advance(PROGRESS_RESPONSE_RECEIVED, "decoding");
        state.fail("bad artifact");
        assert_eq!(state.progress, PROGRESS_RESPONSE_RECEIVED);
        assert!(state.end_time.is_some());
    }

    #[test]
    fn test_only_success_reaches_full_progress() {
        let mut state = GenerationState::default();
        state.begin("go");
        state.advance(100, "almost");
        assert!(state.progress < 100);

        state.succeed(1.4);
        assert_eq!(state.progress, 100);
        assert_eq!(state.confidence, Some(1.0));
    }

    #[test]
    fn test_reset_settled_keeps_in_flight_kinds() {
        let mut states = GenerationStates::default();
        states.sitemap.begin("go");
        states.style.begin("go");
        states.style.succeed(0.5);

        states.reset_settled();
        assert!(states.sitemap.is_generating());
        assert!(states.sitemap.start_time.is_some());
        assert_eq!(states.style, GenerationState::default());
    }

    #[test]
    fn test_kind_maps_to_step() {
        assert_eq!(ArtifactKind::Wireframe.step(), WorkflowStep::Wireframe);
        assert_eq!(ArtifactKind::Style.to_string(), "style");
    }
}
