//! Bounded, pointer-indexed edit history.

use super::ArtifactSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Default number of entries kept before the oldest are evicted
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Semantic tag for a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    ProjectCreated,
    ProjectUpdated,
    SitemapGenerated,
    PageUpdated,
    PageAdded,
    PageRemoved,
    PageMoved,
    WireframeGenerated,
    WireframeUpdated,
    StyleGenerated,
    StyleUpdated,
    ColorTokenUpdated,
    StepCompleted,
    WorkflowReset,
    SessionImported,
    ProjectLoaded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    pub description: String,
    pub data: Option<Value>,
    /// Artifacts as they stood right after this edit
    pub snapshot: Option<Arc<ArtifactSet>>,
}

/// Append-only log with an undo pointer.
///
/// `pointer` is `None` only while the log is empty; otherwise it indexes the
/// entry that reflects the current state.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    pointer: Option<usize>,
    max_entries: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl HistoryLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            pointer: None,
            max_entries: max_entries.max(1),
        }
    }

    /// Append an entry, discarding any redo branch past the pointer and
    /// evicting the oldest entries beyond the cap.
    pub fn add(
        &mut self,
        action: HistoryAction,
        description: impl Into<String>,
        data: Option<Value>,
        snapshot: Option<Arc<ArtifactSet>>,
    ) -> &HistoryEntry {
        match self.pointer {
            Some(p) => self.entries.truncate(p + 1),
            None => self.entries.clear(),
        }

        self.entries.push_back(HistoryEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            description: description.into(),
            data,
            snapshot,
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }

        let tail = self.entries.len() - 1;
        self.pointer = Some(tail);
        &self.entries[tail]
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.pointer, Some(p) if p > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.pointer, Some(p) if p + 1 < self.entries.len())
    }

    /// Step the pointer back. Returns the entry now current.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        let p = self.pointer? - 1;
        self.pointer = Some(p);
        self.entries.get(p)
    }

    /// Step the pointer forward. Returns the entry now current.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        let p = self.pointer? + 1;
        self.pointer = Some(p);
        self.entries.get(p)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.pointer.and_then(|p| self.entries.get(p))
    }

    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(n: usize, cap: usize) -> HistoryLog {
        let mut log = HistoryLog::new(cap);
        for i in 0..n {
            log.add(HistoryAction::PageUpdated, format!("edit {}", i), None, None);
        }
        log
    }

    fn descriptions(log: &HistoryLog) -> Vec<String> {
        log.entries().map(|e| e.description.clone()).collect()
    }

    #[test]
    fn test_add_advances_pointer() {
        let log = log_with(3, 10);
        assert_eq!(log.len(), 3);
        assert_eq!(log.pointer(), Some(2));
        assert_eq!(log.current().unwrap().description, "edit 2");
    }

    #[test]
    fn test_undo_redo_move_pointer() {
        let mut log = log_with(3, 10);
        assert_eq!(log.undo().unwrap().description, "edit 1");
        assert_eq!(log.undo().unwrap().description, "edit 0");
        assert!(log.undo().is_none());
        assert_eq!(log.pointer(), Some(0));

        assert_eq!(log.redo().unwrap().description, "edit 1");
        assert!(log.can_redo());
        log.redo();
        assert!(log.redo().is_none());
    }

    #[test]
    fn test_add_after_undo_discards_redo_branch() {
        let mut log = log_with(4, 10);
        log.undo();
        log.undo();
        log.add(HistoryAction::PageAdded, "branch", None, None);

        assert_eq!(descriptions(&log), vec!["edit 0", "edit 1", "branch"]);
        assert!(!log.can_redo());
        assert_eq!(log.pointer(), Some(2));
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let log = log_with(7, 5);
        assert_eq!(log.len(), 5);
        assert_eq!(
            descriptions(&log),
            vec!["edit 2", "edit 3", "edit 4", "edit 5", "edit 6"]
        );
        assert_eq!(log.current().unwrap().description, "edit 6");
    }

    #[test]
    fn test_clear() {
        let mut log = log_with(3, 10);
        log.clear();
        assert!(log.is_empty());
        assert!(log.current().is_none());
        assert!(!log.can_undo());
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let log = log_with(3, 0);
        assert_eq!(log.max_entries(), 1);
        assert_eq!(log.len(), 1);
    }
}
