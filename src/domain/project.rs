//! Project entity: identity and lifecycle of one website design.

use super::WorkflowStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Archived,
}

/// Category of site being designed; passed to the generator as context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteType {
    Landing,
    Business,
    Portfolio,
    Blog,
    Ecommerce,
    Saas,
    Documentation,
    #[default]
    Other,
}

impl WebsiteType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Landing => "Landing page",
            Self::Business => "Business",
            Self::Portfolio => "Portfolio",
            Self::Blog => "Blog",
            Self::Ecommerce => "E-commerce",
            Self::Saas => "SaaS",
            Self::Documentation => "Documentation",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub website_type: WebsiteType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
    pub current_step: WorkflowStep,
    pub status: ProjectStatus,
}

/// Partial update for project metadata. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website_type: Option<WebsiteType>,
    pub status: Option<ProjectStatus>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        website_type: WebsiteType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::generate(),
            name: name.into(),
            description: description.into(),
            website_type,
            created_at: now,
            updated_at: now,
            version: 1,
            current_step: WorkflowStep::Initial,
            status: ProjectStatus::Draft,
        }
    }

    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(website_type) = update.website_type {
            self.website_type = website_type;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }

    /// Record completion of a workflow step
    pub fn record_step(&mut self, step: WorkflowStep) {
        self.current_step = step;
        self.version += 1;
        self.updated_at = Utc::now();
        self.status = if step == WorkflowStep::Export {
            ProjectStatus::Completed
        } else if self.status == ProjectStatus::Draft {
            ProjectStatus::InProgress
        } else {
            self.status
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_new() {
        let project = Project::new("Acme", "Rockets", WebsiteType::Landing);
        assert_eq!(project.name, "Acme");
        assert_eq!(project.version, 1);
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.current_step, WorkflowStep::Initial);
    }

    #[test]
    fn test_record_step_bumps_version() {
        let mut project = Project::new("Acme", "", WebsiteType::Business);
        project.record_step(WorkflowStep::Sitemap);
        assert_eq!(project.version, 2);
        assert_eq!(project.status, ProjectStatus::InProgress);

        project.record_step(WorkflowStep::Export);
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.current_step, WorkflowStep::Export);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut project = Project::new("Acme", "old", WebsiteType::Blog);
        project.apply(ProjectUpdate {
            description: Some("new".to_string()),
            ..Default::default()
        });
        assert_eq!(project.name, "Acme");
        assert_eq!(project.description, "new");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
