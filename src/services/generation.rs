//! The external generation service boundary.

use crate::domain::{ArtifactKind, Page, Project, SitemapStructure, StyleGuide, WebsiteType};
use crate::error::GenerationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything the generator is told about one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: ArtifactKind,
    pub prompt: String,
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    #[serde(default)]
    pub website_type: WebsiteType,
    /// Target page for wireframe requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    /// Current sitemap, given as context to wireframe and style requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<SitemapStructure>,
    /// Current style guide, given as context when regenerating style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_guide: Option<StyleGuide>,
}

impl GenerationRequest {
    pub fn new(kind: ArtifactKind, prompt: impl Into<String>, project: &Project) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            project_name: project.name.clone(),
            project_description: project.description.clone(),
            website_type: project.website_type,
            page: None,
            sitemap: None,
            style_guide: None,
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sitemap(mut self, sitemap: Option<SitemapStructure>) -> Self {
        self.sitemap = sitemap;
        self
    }

    pub fn with_style_guide(mut self, style_guide: Option<StyleGuide>) -> Self {
        self.style_guide = style_guide;
        self
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    /// Generator's confidence in the result, 0.0 to 1.0
    pub confidence: f32,
    #[serde(default)]
    pub processing_time_ms: u64,
    #[serde(default)]
    pub tokens_used: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The artifact document, decoded by the coordinator for its kind
    pub artifact: Value,
    pub metadata: GenerationMetadata,
}

/// A generator of design artifacts.
///
/// Implementations may fail with a human-readable message and are assumed
/// safe to retry. No partial progress is reported.
#[async_trait]
pub trait GenerationService: Send + Sync + 'static {
    async fn generate_artifact(&self, request: &GenerationRequest)
        -> GenerationResult<GenerationResponse>;
}
