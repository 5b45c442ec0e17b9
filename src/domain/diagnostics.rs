//! Step-tagged errors and warnings surfaced to the user.
//!
//! Diagnostics are independent of the history log. Entries stay until they
//! are removed or the collection is cleared; resolving or acknowledging only
//! sets a flag.

use super::WorkflowStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    GenerationFailed,
    ImportFailed,
    PersistenceFailed,
    OrphanedWireframe,
    Custom,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerationFailed => "GENERATION_FAILED",
            Self::ImportFailed => "IMPORT_FAILED",
            Self::PersistenceFailed => "PERSISTENCE_FAILED",
            Self::OrphanedWireframe => "ORPHANED_WIREFRAME",
            Self::Custom => "CUSTOM",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderError {
    pub id: String,
    pub code: DiagnosticCode,
    pub message: String,
    pub severity: Severity,
    pub step: WorkflowStep,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderWarning {
    pub id: String,
    pub code: DiagnosticCode,
    pub message: String,
    pub step: WorkflowStep,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

/// Collected errors and warnings for a session
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsRegistry {
    errors: Vec<BuilderError>,
    warnings: Vec<BuilderWarning>,
}

impl DiagnosticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and return its id. Identical errors are not merged.
    pub fn add_error(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        severity: Severity,
        step: WorkflowStep,
        details: Option<Value>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.errors.push(BuilderError {
            id: id.clone(),
            code,
            message: message.into(),
            severity,
            step,
            timestamp: Utc::now(),
            details,
            resolved: false,
        });
        id
    }

    pub fn add_warning(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        step: WorkflowStep,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.warnings.push(BuilderWarning {
            id: id.clone(),
            code,
            message: message.into(),
            step,
            timestamp: Utc::now(),
            acknowledged: false,
        });
        id
    }

    /// Delete an error outright. Returns false if the id is unknown.
    pub fn remove_error(&mut self, id: &str) -> bool {
        let before = self.errors.len();
        self.errors.retain(|e| e.id != id);
        self.errors.len() != before
    }

    pub fn remove_warning(&mut self, id: &str) -> bool {
        let before = self.warnings.len();
        self.warnings.retain(|w| w.id != id);
        self.warnings.len() != before
    }

    /// Flag an error as resolved without deleting it
    pub fn mark_error_resolved(&mut self, id: &str) -> bool {
        match self.errors.iter_mut().find(|e| e.id == id) {
            Some(error) => {
                error.resolved = true;
                true
            }
            None => false,
        }
    }

    pub fn acknowledge_warning(&mut self, id: &str) -> bool {
        match self.warnings.iter_mut().find(|w| w.id == id) {
            Some(warning) => {
                warning.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    pub fn clear(&mut self) {
        self.clear_errors();
        self.clear_warnings();
    }

    pub fn errors(&self) -> &[BuilderError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[BuilderWarning] {
        &self.warnings
    }

    pub fn unresolved_errors(&self) -> impl Iterator<Item = &BuilderError> {
        self.errors.iter().filter(|e| !e.resolved)
    }

    pub fn errors_for_step(&self, step: WorkflowStep) -> impl Iterator<Item = &BuilderError> {
        self.errors.iter().filter(move |e| e.step == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_not_removal() {
        let mut registry = DiagnosticsRegistry::new();
        let id = registry.add_error(
            DiagnosticCode::GenerationFailed,
            "timeout",
            Severity::High,
            WorkflowStep::Sitemap,
            None,
        );

        assert!(registry.mark_error_resolved(&id));
        assert_eq!(registry.errors().len(), 1);
        assert!(registry.errors()[0].resolved);
        assert_eq!(registry.unresolved_errors().count(), 0);

        assert!(registry.remove_error(&id));
        assert!(registry.errors().is_empty());
        assert!(!registry.remove_error(&id));
    }

    #[test]
    fn test_identical_errors_accumulate() {
        let mut registry = DiagnosticsRegistry::new();
        for _ in 0..3 {
            registry.add_error(
                DiagnosticCode::GenerationFailed,
                "same",
                Severity::Medium,
                WorkflowStep::Style,
                None,
            );
        }
        assert_eq!(registry.errors().len(), 3);
        assert_eq!(registry.errors_for_step(WorkflowStep::Style).count(), 3);
        assert_eq!(registry.errors_for_step(WorkflowStep::Sitemap).count(), 0);
    }

    #[test]
    fn test_warnings_acknowledge_and_clear() {
        let mut registry = DiagnosticsRegistry::new();
        let id = registry.add_warning(
            DiagnosticCode::OrphanedWireframe,
            "page gone",
            WorkflowStep::Wireframe,
        );
        assert!(registry.acknowledge_warning(&id));
        assert!(registry.warnings()[0].acknowledged);
        assert!(!registry.acknowledge_warning("missing"));

        registry.clear_warnings();
        assert!(registry.warnings().is_empty());
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&DiagnosticCode::ImportFailed).unwrap();
        assert_eq!(json, "\"IMPORT_FAILED\"");
        assert_eq!(DiagnosticCode::ImportFailed.to_string(), "IMPORT_FAILED");
    }
}
