//! Per-page wireframes.

use super::validation::{IssueSeverity, ValidationReport};
use super::SitemapStructure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Header,
    Navigation,
    Hero,
    #[default]
    Section,
    Text,
    Image,
    Button,
    Form,
    Grid,
    Card,
    List,
    Footer,
}

/// One node of a wireframe's component tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireframeComponent {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ComponentKind,
    pub name: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<WireframeComponent>,
}

impl WireframeComponent {
    pub fn new(id: impl Into<String>, kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            props: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(WireframeComponent::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    #[default]
    SingleColumn,
    TwoColumn,
    Sidebar,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wireframe {
    pub id: String,
    /// Filled from the request when the generator omits it
    #[serde(default)]
    pub page_id: String,
    pub name: String,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default)]
    pub components: Vec<WireframeComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Wireframe {
    pub fn component_count(&self) -> usize {
        self.components.iter().map(WireframeComponent::count).sum()
    }
}

/// Partial update for a wireframe. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct WireframeUpdate {
    pub name: Option<String>,
    pub layout: Option<LayoutKind>,
    pub components: Option<Vec<WireframeComponent>>,
    pub notes: Option<String>,
}

impl Wireframe {
    pub fn apply(&mut self, update: WireframeUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(layout) = update.layout {
            self.layout = layout;
        }
        if let Some(components) = update.components {
            self.components = components;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        self.updated_at = Utc::now();
    }
}

/// Wireframes keyed by sitemap page id
pub type WireframeMap = BTreeMap<String, Wireframe>;

/// Report wireframes whose key no longer names a sitemap page.
///
/// Page removal does not cascade to wireframes, so these are warnings.
pub fn check_orphans(wireframes: &WireframeMap, sitemap: Option<&SitemapStructure>) -> ValidationReport {
    let mut report = ValidationReport::default();
    for page_id in wireframes.keys() {
        let known = sitemap.map(|s| s.contains(page_id)).unwrap_or(false);
        if !known {
            report.push(
                IssueSeverity::Warning,
                "ORPHANED_WIREFRAME",
                format!("Wireframe references unknown page '{}'", page_id),
                Some(page_id),
            );
        }
    }
    report
}
