//! The session context: state plus every operation the UI layer calls.
//!
//! A [`Session`] is a cheap clonable handle. All mutations apply
//! synchronously under a lock that is never held across an await; the only
//! suspension point is the external generation call inside a coordinator.

mod coordinator;
mod state;

pub use coordinator::{
    ArtifactSpec, Coordinator, SitemapArtifact, StyleArtifact, WireframeArtifact,
};
pub use state::SessionState;

use crate::config::BuilderConfig;
use crate::domain::{
    check_orphans, ArtifactKind, BuilderError, BuilderWarning, DiagnosticCode, GenerationState,
    HistoryAction, IssueSeverity, PageUpdate, Project, ProjectId, ProjectUpdate, Severity,
    SitemapStructure, StyleGuide, StyleGuideUpdate, ValidationReport, WebsiteType,
    WireframeUpdate, WorkflowStep,
};
use crate::error::{AppError, ImportError, PageError, PersistenceError, Result, StyleError};
use crate::services::{
    export_sitemap, export_style_guide, GenerationRequest, GenerationService,
    PersistenceAdapter, SessionDocument, SitemapFormat, StyleFormat, SESSION_FORMAT_VERSION,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 64;

/// Notifications published as the session changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GenerationStarted { kind: ArtifactKind },
    GenerationCompleted { kind: ArtifactKind },
    GenerationFailed { kind: ArtifactKind, message: String },
    StepCompleted(WorkflowStep),
    Saved { at: DateTime<Utc> },
}

struct Shared {
    state: Mutex<SessionState>,
    service: Arc<dyn GenerationService>,
    persistence: Arc<dyn PersistenceAdapter>,
    events: broadcast::Sender<SessionEvent>,
    sitemap: Coordinator<SitemapArtifact>,
    wireframe: Coordinator<WireframeArtifact>,
    style: Coordinator<StyleArtifact>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Shared>,
}

impl Session {
    pub fn new(
        service: Arc<dyn GenerationService>,
        persistence: Arc<dyn PersistenceAdapter>,
        config: &BuilderConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(SessionState::new(config)),
                service,
                persistence,
                events,
                sitemap: Coordinator::new(),
                wireframe: Coordinator::new(),
                style: Coordinator::new(),
            }),
        }
    }

    // ----- plumbing -----

    /// Read the state under the lock
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let guard = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub(crate) fn service(&self) -> &dyn GenerationService {
        self.inner.service.as_ref()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Clone of the full state, for display
    pub fn state(&self) -> SessionState {
        self.with_state(SessionState::clone)
    }

    fn require_project(&self) -> Result<Project> {
        self.with_state(|s| s.project.clone()).ok_or(AppError::NoProject)
    }

    // ----- project -----

    /// Start a new project. Every artifact, workflow, diagnostic and history
    /// record of the previous project is discarded.
    pub fn create_project(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        website_type: WebsiteType,
    ) -> ProjectId {
        let project = Project::new(name, description, website_type);
        let id = project.id.clone();
        tracing::info!("Creating project {} ({})", project.name, id);

        self.update(|state| {
            state.reset_workflow();
            state.history.clear();
            state.last_saved = None;
            let description = format!("Created project {}", project.name);
            state.project = Some(project);
            state.complete_step(WorkflowStep::Initial);
            state.record(HistoryAction::ProjectCreated, description, None);
        });
        id
    }

    pub fn update_project(&self, update: ProjectUpdate) -> Result<()> {
        self.update(|state| {
            let project = state.project.as_mut().ok_or(AppError::NoProject)?;
            project.apply(update);
            let description = format!("Updated project {}", project.name);
            state.record(HistoryAction::ProjectUpdated, description, None);
            Ok(())
        })
    }

    pub fn project(&self) -> Option<Project> {
        self.with_state(|s| s.project.clone())
    }

    /// Replace the session with a saved project
    pub fn load_project(&self, project_id: &ProjectId) -> Result<()> {
        let loaded = self.inner.persistence.load(project_id).and_then(|snapshot| {
            snapshot
                .check_integrity()
                .map_err(|e| PersistenceError::Decode(e.to_string()))?;
            Ok(snapshot)
        });
        let snapshot = match loaded {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to load project {}: {}", project_id, e);
                self.register_persistence_failure(&e);
                return Err(e.into());
            }
        };

        self.update(|state| {
            let description = format!("Loaded project {}", snapshot.project.name);
            state.apply_snapshot(snapshot);
            state.record(HistoryAction::ProjectLoaded, description, None);
        });
        tracing::info!("Loaded project {}", project_id);
        Ok(())
    }

    /// Delete a saved project. Deleting the open project also resets the
    /// session.
    pub fn delete_project(&self, project_id: &ProjectId) -> Result<()> {
        self.inner.persistence.delete(project_id)?;
        let is_open = self.with_state(|s| s.project.as_ref().is_some_and(|p| &p.id == project_id));
        if is_open {
            self.reset_session();
        }
        tracing::info!("Deleted project {}", project_id);
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectId>> {
        Ok(self.inner.persistence.list()?)
    }

    // ----- workflow -----

    pub fn active_step(&self) -> WorkflowStep {
        self.with_state(|s| s.stepper.active())
    }

    pub fn completed_steps(&self) -> BTreeSet<WorkflowStep> {
        self.with_state(|s| s.stepper.completed().clone())
    }

    /// Move the active step without gating
    pub fn set_active_step(&self, step: WorkflowStep) {
        self.update(|state| state.stepper.set_active(step));
    }

    pub fn complete_step(&self, step: WorkflowStep) {
        let newly = self.update(|state| {
            let newly = state.complete_step(step);
            if newly {
                state.record(
                    HistoryAction::StepCompleted,
                    format!("Completed step {}", step),
                    None,
                );
            }
            newly
        });
        if newly {
            self.emit(SessionEvent::StepCompleted(step));
        }
    }

    pub fn can_proceed_to_step(&self, step: WorkflowStep) -> bool {
        self.with_state(|s| s.stepper.can_proceed_to(step))
    }

    /// Gated navigation: enter `step` only if the stepper allows it
    pub fn request_step(&self, step: WorkflowStep) -> Result<()> {
        self.update(|state| {
            if !state.stepper.can_proceed_to(step) {
                return Err(AppError::StepLocked(step));
            }
            state.stepper.set_active(step);
            Ok(())
        })
    }

    /// Back to `initial`, discarding artifacts, diagnostics and generation
    /// states. History and the project itself survive.
    pub fn reset_workflow(&self) {
        self.update(|state| {
            state.reset_workflow();
            state.record(HistoryAction::WorkflowReset, "Reset workflow", None);
        });
        tracing::info!("Workflow reset");
    }

    // ----- generation -----

    pub fn generation_state(&self, kind: ArtifactKind) -> GenerationState {
        self.with_state(|s| s.generation.get(kind).clone())
    }

    pub async fn generate_sitemap(&self, prompt: impl Into<String>) -> Result<()> {
        let project = self.require_project()?;
        let request = GenerationRequest::new(ArtifactKind::Sitemap, prompt, &project);
        self.inner.sitemap.generate(self, request).await
    }

    /// Generate again from the last prompt (or the project description)
    pub async fn regenerate_sitemap(&self) -> Result<()> {
        let prompt = self.last_prompt(ArtifactKind::Sitemap)?;
        self.generate_sitemap(prompt).await
    }

    pub async fn generate_wireframe(&self, page_id: &str, prompt: impl Into<String>) -> Result<()> {
        let project = self.require_project()?;
        let (page, sitemap) = self.with_state(|s| {
            let sitemap = s.artifacts.sitemap.clone().ok_or(PageError::NoSitemap)?;
            let page = sitemap
                .find_page(page_id)
                .cloned()
                .ok_or_else(|| PageError::NotFound(page_id.to_string()))?;
            Ok::<_, PageError>((page, sitemap))
        })?;

        let request = GenerationRequest::new(ArtifactKind::Wireframe, prompt, &project)
            .with_page(page)
            .with_sitemap(Some(sitemap));
        self.inner.wireframe.generate(self, request).await
    }

    pub async fn regenerate_wireframe(&self, page_id: &str) -> Result<()> {
        let prompt = self.last_prompt(ArtifactKind::Wireframe)?;
        self.generate_wireframe(page_id, prompt).await
    }

    pub async fn generate_style(&self, prompt: impl Into<String>) -> Result<()> {
        let project = self.require_project()?;
        let (sitemap, style_guide) = self.with_state(|s| {
            (
                s.artifacts.sitemap.clone(),
                s.artifacts.style_guide.clone(),
            )
        });
        let request = GenerationRequest::new(ArtifactKind::Style, prompt, &project)
            .with_sitemap(sitemap)
            .with_style_guide(style_guide);
        self.inner.style.generate(self, request).await
    }

    pub async fn regenerate_style(&self) -> Result<()> {
        let prompt = self.last_prompt(ArtifactKind::Style)?;
        self.generate_style(prompt).await
    }

    fn last_prompt(&self, kind: ArtifactKind) -> Result<String> {
        self.with_state(|s| {
            s.last_prompts
                .get(&kind)
                .cloned()
                .or_else(|| {
                    s.project
                        .as_ref()
                        .map(|p| p.description.clone())
                        .filter(|d| !d.trim().is_empty())
                })
                .ok_or(AppError::MissingContext("regenerate"))
        })
    }

    // ----- sitemap -----

    pub fn sitemap(&self) -> Option<SitemapStructure> {
        self.with_state(|s| s.artifacts.sitemap.clone())
    }

    /// Structural report for the sitemap plus orphaned wireframes
    pub fn validate_sitemap(&self) -> ValidationReport {
        self.with_state(|s| {
            let mut report = match &s.artifacts.sitemap {
                Some(sitemap) => sitemap.validate(),
                None => {
                    let mut report = ValidationReport::default();
                    report.push(
                        IssueSeverity::Error,
                        "NO_SITEMAP",
                        "No sitemap has been generated",
                        None,
                    );
                    report
                }
            };
            report.merge(check_orphans(
                &s.artifacts.wireframes,
                s.artifacts.sitemap.as_ref(),
            ));
            report
        })
    }

    pub fn update_sitemap_page(&self, page_id: &str, update: PageUpdate) -> Result<()> {
        self.mutate_sitemap(HistoryAction::PageUpdated, |sitemap| {
            sitemap.update_page(page_id, update)?;
            Ok(format!("Updated page {}", page_id))
        })
    }

    /// Add a placeholder page. Returns its id.
    pub fn add_page(&self, parent_id: Option<&str>) -> Result<String> {
        let mut new_id = String::new();
        self.mutate_sitemap(HistoryAction::PageAdded, |sitemap| {
            new_id = sitemap.add_page(parent_id)?;
            Ok(format!("Added page {}", new_id))
        })?;
        Ok(new_id)
    }

    pub fn remove_page(&self, page_id: &str) -> Result<()> {
        self.mutate_sitemap(HistoryAction::PageRemoved, |sitemap| {
            let removed = sitemap.remove_page(page_id)?;
            Ok(format!(
                "Removed page {} and {} descendants",
                removed.id,
                removed.subtree_size() - 1
            ))
        })
    }

    pub fn move_page(
        &self,
        page_id: &str,
        new_parent_id: Option<&str>,
        new_order: Option<u32>,
    ) -> Result<()> {
        self.mutate_sitemap(HistoryAction::PageMoved, |sitemap| {
            sitemap.move_page(page_id, new_parent_id, new_order)?;
            Ok(format!(
                "Moved page {} under {}",
                page_id,
                new_parent_id.unwrap_or("root")
            ))
        })
    }

    fn mutate_sitemap(
        &self,
        action: HistoryAction,
        f: impl FnOnce(&mut SitemapStructure) -> std::result::Result<String, PageError>,
    ) -> Result<()> {
        self.update(|state| {
            let sitemap = state
                .artifacts
                .sitemap
                .as_mut()
                .ok_or(PageError::NoSitemap)?;
            let description = f(sitemap)?;
            state.record(action, description, None);
            Ok(())
        })
    }

    // ----- wireframes -----

    pub fn wireframe(&self, page_id: &str) -> Option<crate::domain::Wireframe> {
        self.with_state(|s| s.artifacts.wireframes.get(page_id).cloned())
    }

    pub fn update_wireframe(&self, page_id: &str, update: WireframeUpdate) -> Result<()> {
        self.update(|state| {
            let wireframe = state
                .artifacts
                .wireframes
                .get_mut(page_id)
                .ok_or_else(|| PageError::WireframeNotFound(page_id.to_string()))?;
            wireframe.apply(update);
            state.record(
                HistoryAction::WireframeUpdated,
                format!("Updated wireframe for page {}", page_id),
                None,
            );
            Ok(())
        })
    }

    // ----- style guide -----

    pub fn style_guide(&self) -> Option<StyleGuide> {
        self.with_state(|s| s.artifacts.style_guide.clone())
    }

    pub fn update_style_guide(&self, update: StyleGuideUpdate) -> Result<()> {
        self.update(|state| {
            let guide = state
                .artifacts
                .style_guide
                .as_mut()
                .ok_or(StyleError::Missing)?;
            guide.apply(update)?;
            state.record(HistoryAction::StyleUpdated, "Updated style guide", None);
            Ok(())
        })
    }

    /// Edit one color token without touching the rest of the guide
    pub fn update_color_token(&self, name: &str, value: &str) -> Result<()> {
        self.update(|state| {
            let guide = state
                .artifacts
                .style_guide
                .as_mut()
                .ok_or(StyleError::Missing)?;
            guide.set_color(name, value)?;
            state.record(
                HistoryAction::ColorTokenUpdated,
                format!("Set color {} to {}", name, value),
                Some(json!({ "token": name, "value": value })),
            );
            Ok(())
        })
    }

    // ----- history -----

    /// Step back one entry and restore the artifacts recorded there
    pub fn undo(&self) -> bool {
        self.update(|state| {
            let Some(entry) = state.history.undo() else {
                return false;
            };
            let snapshot = entry.snapshot.clone();
            if let Some(snapshot) = snapshot {
                state.restore_artifacts(&snapshot);
            }
            true
        })
    }

    /// Step forward one entry and restore the artifacts recorded there
    pub fn redo(&self) -> bool {
        self.update(|state| {
            let Some(entry) = state.history.redo() else {
                return false;
            };
            let snapshot = entry.snapshot.clone();
            if let Some(snapshot) = snapshot {
                state.restore_artifacts(&snapshot);
            }
            true
        })
    }

    pub fn can_undo(&self) -> bool {
        self.with_state(|s| s.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.with_state(|s| s.history.can_redo())
    }

    pub fn clear_history(&self) {
        self.update(|state| state.history.clear());
    }

    // ----- diagnostics -----

    pub fn errors(&self) -> Vec<BuilderError> {
        self.with_state(|s| s.diagnostics.errors().to_vec())
    }

    pub fn warnings(&self) -> Vec<BuilderWarning> {
        self.with_state(|s| s.diagnostics.warnings().to_vec())
    }

    pub fn add_error(
        &self,
        code: DiagnosticCode,
        message: impl Into<String>,
        severity: Severity,
        step: WorkflowStep,
    ) -> String {
        self.update(|state| state.diagnostics.add_error(code, message, severity, step, None))
    }

    pub fn add_warning(
        &self,
        code: DiagnosticCode,
        message: impl Into<String>,
        step: WorkflowStep,
    ) -> String {
        self.update(|state| state.diagnostics.add_warning(code, message, step))
    }

    pub fn remove_error(&self, id: &str) -> bool {
        self.update(|state| state.diagnostics.remove_error(id))
    }

    pub fn remove_warning(&self, id: &str) -> bool {
        self.update(|state| state.diagnostics.remove_warning(id))
    }

    pub fn mark_error_resolved(&self, id: &str) -> bool {
        self.update(|state| state.diagnostics.mark_error_resolved(id))
    }

    pub fn acknowledge_warning(&self, id: &str) -> bool {
        self.update(|state| state.diagnostics.acknowledge_warning(id))
    }

    pub fn clear_errors(&self) {
        self.update(|state| state.diagnostics.clear_errors());
    }

    pub fn clear_warnings(&self) {
        self.update(|state| state.diagnostics.clear_warnings());
    }

    fn register_persistence_failure(&self, error: &PersistenceError) {
        self.update(|state| {
            let step = state.stepper.active();
            state.diagnostics.add_error(
                DiagnosticCode::PersistenceFailed,
                error.to_string(),
                Severity::Medium,
                step,
                None,
            );
        });
    }

    // ----- persistence -----

    /// Write the persisted subset through the adapter
    pub fn save(&self) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let snapshot = self.update(|state| {
            let mut snapshot = state.to_snapshot()?;
            snapshot.last_saved = Some(now);
            Some(snapshot)
        });
        let snapshot = snapshot.ok_or(AppError::NoProject)?;

        if let Err(e) = self.inner.persistence.save(&snapshot) {
            tracing::warn!("Failed to save project {}: {}", snapshot.project.id, e);
            self.register_persistence_failure(&e);
            return Err(e.into());
        }

        self.update(|state| state.last_saved = Some(now));
        tracing::info!("Saved project {}", snapshot.project.id);
        self.emit(SessionEvent::Saved { at: now });
        Ok(now)
    }

    pub fn set_autosave(&self, enabled: bool, interval: Option<Duration>) {
        self.update(|state| {
            state.auto_save_enabled = enabled;
            if let Some(interval) = interval {
                state.auto_save_interval = interval.as_secs().max(1);
            }
        });
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.update(|state| state.sidebar_collapsed = collapsed);
    }

    /// Save periodically while autosave is enabled and a project is open.
    /// The interval is re-read every tick. Abort the handle to stop.
    pub fn spawn_autosave(&self) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            loop {
                let interval =
                    session.with_state(|s| Duration::from_secs(s.auto_save_interval.max(1)));
                tokio::time::sleep(interval).await;

                let due = session.with_state(|s| s.auto_save_enabled && s.project.is_some());
                if due {
                    // Failures are already registered as diagnostics
                    let _ = session.save();
                }
            }
        })
    }

    // ----- whole session -----

    /// Forget everything, including the project and history
    pub fn reset_session(&self) {
        self.update(|state| {
            state.reset_workflow();
            state.history.clear();
            state.project = None;
            state.last_saved = None;
        });
        tracing::info!("Session reset");
    }

    /// Serialize the persisted subset as a portable JSON document
    pub fn export_session(&self) -> Result<String> {
        let snapshot = self
            .with_state(SessionState::to_snapshot)
            .ok_or(AppError::NoProject)?;
        Ok(serde_json::to_string_pretty(&SessionDocument::new(snapshot))?)
    }

    /// Replace the session with an exported document. On any parse failure
    /// the state is left untouched and one `IMPORT_FAILED` error is recorded.
    pub fn import_session(&self, text: &str) -> Result<()> {
        let parsed = serde_json::from_str::<SessionDocument>(text)
            .map_err(ImportError::from)
            .and_then(|doc| {
                if doc.format_version > SESSION_FORMAT_VERSION {
                    return Err(ImportError::UnsupportedVersion(doc.format_version));
                }
                doc.snapshot.check_integrity()?;
                Ok(doc)
            });

        match parsed {
            Ok(document) => {
                self.update(|state| {
                    let description =
                        format!("Imported project {}", document.snapshot.project.name);
                    state.apply_snapshot(document.snapshot);
                    state.record(HistoryAction::SessionImported, description, None);
                });
                tracing::info!("Imported session");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Session import failed: {}", e);
                self.update(|state| {
                    let step = state.stepper.active();
                    state.diagnostics.add_error(
                        DiagnosticCode::ImportFailed,
                        format!("Import failed: {}", e),
                        Severity::High,
                        step,
                        None,
                    );
                });
                Err(e.into())
            }
        }
    }

    pub fn export_sitemap(&self, format: SitemapFormat) -> Result<String> {
        let sitemap = self.sitemap().ok_or(PageError::NoSitemap)?;
        Ok(export_sitemap(&sitemap, format)?)
    }

    pub fn export_style_guide(&self, format: StyleFormat) -> Result<String> {
        let guide = self.style_guide().ok_or(StyleError::Missing)?;
        Ok(export_style_guide(&guide, format)?)
    }
}
