//! Persistence adapters for the saved subset of a session.
//!
//! History, diagnostics and generation states are session-scoped and never
//! written.

use crate::config::StorageConfig;
use crate::domain::{
    Project, ProjectId, SitemapStructure, StyleGuide, WireframeMap, WorkflowStep,
};
use crate::error::{PageResult, PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Current version of the exported session document
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// The state subset exchanged with persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub project: Project,
    pub sitemap: Option<SitemapStructure>,
    #[serde(default)]
    pub wireframes: WireframeMap,
    pub style_guide: Option<StyleGuide>,
    pub active_step: WorkflowStep,
    #[serde(default)]
    pub completed_steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub sidebar_collapsed: bool,
    pub auto_save_enabled: bool,
    /// Seconds between autosaves
    pub auto_save_interval: u64,
    pub last_saved: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Structural checks a snapshot must pass before a session adopts it
    pub fn check_integrity(&self) -> PageResult<()> {
        match &self.sitemap {
            Some(sitemap) => sitemap.ensure_unique_ids(),
            None => Ok(()),
        }
    }
}

/// Envelope used by whole-session export and import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

impl SessionDocument {
    pub fn new(snapshot: SessionSnapshot) -> Self {
        Self {
            format_version: SESSION_FORMAT_VERSION,
            exported_at: Utc::now(),
            snapshot,
        }
    }
}

/// Storage for session snapshots, one per project
pub trait PersistenceAdapter: Send + Sync + 'static {
    fn save(&self, snapshot: &SessionSnapshot) -> PersistenceResult<()>;
    fn load(&self, project_id: &ProjectId) -> PersistenceResult<SessionSnapshot>;
    fn delete(&self, project_id: &ProjectId) -> PersistenceResult<()>;
    fn list(&self) -> PersistenceResult<Vec<ProjectId>>;
}

/// Stores each project as `<project-id>.json` in a directory
pub struct JsonFileStore {
    directory: PathBuf,
}

impl JsonFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Use the configured directory, or the platform data directory
    pub fn from_config(config: &StorageConfig) -> PersistenceResult<Self> {
        config
            .resolve_directory()
            .map(Self::new)
            .ok_or_else(|| PersistenceError::DirectoryUnavailable(PathBuf::from("<data dir>")))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, project_id: &ProjectId) -> PersistenceResult<PathBuf> {
        let id = project_id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        Ok(self.directory.join(format!("{}.json", id)))
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn save(&self, snapshot: &SessionSnapshot) -> PersistenceResult<()> {
        let path = self.path_for(&snapshot.project.id)?;
        fs::create_dir_all(&self.directory)?;

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PersistenceError::Encode(e.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Saved project {} to {:?}", snapshot.project.id, path);
        Ok(())
    }

    fn load(&self, project_id: &ProjectId) -> PersistenceResult<SessionSnapshot> {
        let path = self.path_for(project_id)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(project_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json).map_err(|e| PersistenceError::Decode(e.to_string()))
    }

    fn delete(&self, project_id: &ProjectId) -> PersistenceResult<()> {
        let path = self.path_for(project_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(project_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> PersistenceResult<Vec<ProjectId>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(ProjectId::from(stem));
            }
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

/// In-process store, for tests and sessions that opt out of disk writes
#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<ProjectId, SessionSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn save(&self, snapshot: &SessionSnapshot) -> PersistenceResult<()> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.project.id.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&self, project_id: &ProjectId) -> PersistenceResult<SessionSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(project_id.to_string()))
    }

    fn delete(&self, project_id: &ProjectId) -> PersistenceResult<()> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(project_id.to_string()))
    }

    fn list(&self) -> PersistenceResult<Vec<ProjectId>> {
        let mut ids: Vec<_> = self
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Page, WebsiteType};
    use tempfile::TempDir;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            project: Project::new("Acme", "Rockets", WebsiteType::Landing),
            sitemap: Some(SitemapStructure::new(vec![Page::new("home", "Home", "/")])),
            wireframes: WireframeMap::new(),
            style_guide: None,
            active_step: WorkflowStep::Sitemap,
            completed_steps: vec![WorkflowStep::Initial, WorkflowStep::Sitemap],
            sidebar_collapsed: false,
            auto_save_enabled: true,
            auto_save_interval: 30,
            last_saved: None,
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("projects"));
        let snapshot = snapshot();

        store.save(&snapshot).unwrap();
        let loaded = store.load(&snapshot.project.id).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(store.list().unwrap(), vec![snapshot.project.id.clone()]);
        assert!(!store
            .directory()
            .join(format!("{}.json.tmp", snapshot.project.id))
            .exists());
    }

    #[test]
    fn test_file_store_missing_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path());
        let snapshot = snapshot();

        assert!(matches!(
            store.load(&snapshot.project.id),
            Err(PersistenceError::NotFound(_))
        ));

        store.save(&snapshot).unwrap();
        store.delete(&snapshot.project.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.delete(&snapshot.project.id),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_store_rejects_path_like_ids() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path());
        assert!(store.load(&ProjectId::from("../escape")).is_err());
    }

    #[test]
    fn test_file_store_corrupt_snapshot() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path());
        fs::write(temp.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(
            store.load(&ProjectId::from("broken")),
            Err(PersistenceError::Decode(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let snapshot = snapshot();
        store.save(&snapshot).unwrap();
        assert_eq!(store.load(&snapshot.project.id).unwrap(), snapshot);
        store.delete(&snapshot.project.id).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_integrity_rejects_duplicate_page_ids() {
        let mut snapshot = snapshot();
        assert!(snapshot.check_integrity().is_ok());

        snapshot.sitemap = Some(SitemapStructure::new(vec![
            Page::new("home", "Home", "/"),
            Page::new("home", "Start", "/start"),
        ]));
        assert!(snapshot.check_integrity().is_err());
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert!(json.get("activeStep").is_some());
        assert!(json.get("autoSaveInterval").is_some());
        assert!(json.get("history").is_none());
    }
}
