//! Unified error types for the sitewright engine.

use crate::domain::{ArtifactKind, WorkflowStep};
use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Style guide error: {0}")]
    Style(#[from] StyleError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("A {0} generation is already in progress")]
    AlreadyGenerating(ArtifactKind),

    #[error("Step '{0}' cannot be entered yet")]
    StepLocked(WorkflowStep),

    #[error("No project loaded")]
    NoProject,

    #[error("Cannot {0}: missing generation context")]
    MissingContext(&'static str),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Sitemap and wireframe mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("No wireframe for page: {0}")]
    WireframeNotFound(String),

    #[error("Cannot move page {0} into its own subtree")]
    WouldCreateCycle(String),

    #[error("No sitemap has been generated")]
    NoSitemap,

    #[error("Priority {0} is outside 1-10")]
    InvalidPriority(u8),

    #[error("Page id '{0}' is used more than once")]
    DuplicateId(String),
}

/// Style guide mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("No style guide has been generated")]
    Missing,

    #[error("Invalid color value for '{token}': {value}")]
    InvalidColor { token: String, value: String },
}

/// Persistence adapter errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("No saved state for project: {0}")]
    NotFound(String),

    #[error("Storage directory unavailable: {0}")]
    DirectoryUnavailable(PathBuf),

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),

    #[error("Failed to decode snapshot: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the external generation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Rejected(String),

    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Service returned an unusable artifact: {0}")]
    InvalidArtifact(String),
}

/// Session import errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed session document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported session format version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid sitemap: {0}")]
    InvalidSitemap(#[from] PageError),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for page mutations
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Result type alias for style guide mutations
pub type StyleResult<T> = std::result::Result<T, StyleError>;

/// Result type alias for persistence operations
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Result type alias for generation service calls
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
