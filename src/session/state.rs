//! The mutable state owned by a session.

use crate::config::BuilderConfig;
use crate::domain::{
    ArtifactKind, ArtifactSet, DiagnosticsRegistry, GenerationStates, HistoryAction, HistoryLog,
    Project, Stepper, WorkflowStep,
};
use crate::services::SessionSnapshot;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a session tracks. Only the [`SessionSnapshot`] subset is
/// persisted; history, diagnostics and generation states are ephemeral.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub project: Option<Project>,
    pub artifacts: ArtifactSet,
    pub stepper: Stepper,
    pub generation: GenerationStates,
    pub history: HistoryLog,
    pub diagnostics: DiagnosticsRegistry,
    pub sidebar_collapsed: bool,
    pub auto_save_enabled: bool,
    /// Seconds between autosaves
    pub auto_save_interval: u64,
    pub last_saved: Option<DateTime<Utc>>,
    /// Prompt of the most recent request per kind, reused by regenerate
    pub(crate) last_prompts: HashMap<ArtifactKind, String>,
    /// Bumped whenever the artifact store is replaced wholesale. A generation
    /// only installs its result into the epoch it started in.
    epoch: u64,
}

impl SessionState {
    pub fn new(config: &BuilderConfig) -> Self {
        Self {
            project: None,
            artifacts: ArtifactSet::default(),
            stepper: Stepper::new(),
            generation: GenerationStates::default(),
            history: HistoryLog::new(config.history.max_entries),
            diagnostics: DiagnosticsRegistry::new(),
            sidebar_collapsed: false,
            auto_save_enabled: config.autosave.enabled,
            auto_save_interval: config.autosave.interval_seconds,
            last_saved: None,
            last_prompts: HashMap::new(),
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Append a history entry carrying the current artifacts
    pub(crate) fn record(
        &mut self,
        action: HistoryAction,
        description: impl Into<String>,
        data: Option<Value>,
    ) {
        let snapshot = Arc::new(self.artifacts.clone());
        let entry = self.history.add(action, description, data, Some(snapshot));
        tracing::debug!("History: {:?} {}", entry.action, entry.description);
    }

    /// Mark a step complete and stamp the project. Returns true if the step
    /// was newly completed.
    pub(crate) fn complete_step(&mut self, step: WorkflowStep) -> bool {
        let newly = self.stepper.complete(step);
        if let Some(project) = self.project.as_mut() {
            project.record_step(step);
        }
        tracing::info!("Step {} completed", step);
        newly
    }

    /// Drop artifacts, workflow progress, diagnostics and generation states.
    /// History and project identity are kept.
    pub(crate) fn reset_workflow(&mut self) {
        self.stepper.reset();
        self.artifacts = ArtifactSet::default();
        self.diagnostics.clear();
        self.generation.reset_settled();
        self.last_prompts.clear();
        self.epoch += 1;
        if let Some(project) = self.project.as_mut() {
            project.current_step = WorkflowStep::Initial;
            project.updated_at = Utc::now();
        }
    }

    /// Replace artifacts with the ones recorded in a history entry
    pub(crate) fn restore_artifacts(&mut self, snapshot: &ArtifactSet) {
        self.artifacts = snapshot.clone();
    }

    pub fn to_snapshot(&self) -> Option<SessionSnapshot> {
        let project = self.project.clone()?;
        Some(SessionSnapshot {
            project,
            sitemap: self.artifacts.sitemap.clone(),
            wireframes: self.artifacts.wireframes.clone(),
            style_guide: self.artifacts.style_guide.clone(),
            active_step: self.stepper.active(),
            completed_steps: self.stepper.completed().iter().copied().collect(),
            sidebar_collapsed: self.sidebar_collapsed,
            auto_save_enabled: self.auto_save_enabled,
            auto_save_interval: self.auto_save_interval,
            last_saved: self.last_saved,
        })
    }

    /// Adopt a persisted snapshot. Session-scoped state starts fresh.
    pub(crate) fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.project = Some(snapshot.project);
        self.artifacts = ArtifactSet {
            sitemap: snapshot.sitemap,
            wireframes: snapshot.wireframes,
            style_guide: snapshot.style_guide,
        };
        self.stepper = Stepper::restore(snapshot.active_step, snapshot.completed_steps);
        self.sidebar_collapsed = snapshot.sidebar_collapsed;
        self.auto_save_enabled = snapshot.auto_save_enabled;
        self.auto_save_interval = snapshot.auto_save_interval.max(1);
        self.last_saved = snapshot.last_saved;

        self.generation.reset_settled();
        self.diagnostics.clear();
        self.history.clear();
        self.last_prompts.clear();
        self.epoch += 1;
    }
}
