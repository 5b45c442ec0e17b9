//! Workflow steps and the stepper that gates movement between them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stage of the design pipeline, totally ordered by rank
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    #[default]
    Initial,
    Sitemap,
    Wireframe,
    Style,
    Review,
    Export,
}

impl WorkflowStep {
    /// All steps in pipeline order
    pub const ALL: [WorkflowStep; 6] = [
        Self::Initial,
        Self::Sitemap,
        Self::Wireframe,
        Self::Style,
        Self::Review,
        Self::Export,
    ];

    /// Position of this step in the pipeline
    pub fn rank(&self) -> usize {
        match self {
            Self::Initial => 0,
            Self::Sitemap => 1,
            Self::Wireframe => 2,
            Self::Style => 3,
            Self::Review => 4,
            Self::Export => 5,
        }
    }

    /// The step immediately before this one, if any
    pub fn previous(&self) -> Option<Self> {
        self.rank().checked_sub(1).map(|r| Self::ALL[r])
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Sitemap => "Sitemap",
            Self::Wireframe => "Wireframe",
            Self::Style => "Style",
            Self::Review => "Review",
            Self::Export => "Export",
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Active step plus the set of steps completed so far.
///
/// Navigation is free: `set_active` never checks the gate. Callers that want
/// gated movement ask [`Stepper::can_proceed_to`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stepper {
    active: WorkflowStep,
    completed: BTreeSet<WorkflowStep>,
}

impl Stepper {
    /// Create a stepper positioned at `initial` with nothing completed
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stepper from persisted parts
    pub fn restore(active: WorkflowStep, completed: impl IntoIterator<Item = WorkflowStep>) -> Self {
        Self {
            active,
            completed: completed.into_iter().collect(),
        }
    }

    pub fn active(&self) -> WorkflowStep {
        self.active
    }

    pub fn completed(&self) -> &BTreeSet<WorkflowStep> {
        &self.completed
    }

    pub fn is_completed(&self, step: WorkflowStep) -> bool {
        self.completed.contains(&step)
    }

    /// Move the active pointer without any gating
    pub fn set_active(&mut self, step: WorkflowStep) {
        self.active = step;
    }

    /// Mark a step completed and make it active. Returns true if the step was
    /// not already completed.
    pub fn complete(&mut self, step: WorkflowStep) -> bool {
        self.active = step;
        self.completed.insert(step)
    }

    /// Whether `step` may be entered from the current position
    pub fn can_proceed_to(&self, step: WorkflowStep) -> bool {
        if step.rank() > self.active.rank() + 1 {
            return false;
        }
        match step.previous() {
            Some(prev) => self.completed.contains(&prev),
            None => true,
        }
    }

    /// Back to `initial` with nothing completed
    pub fn reset(&mut self) {
        self.active = WorkflowStep::Initial;
        self.completed.clear();
    }
}
