//! sitewright: orchestration engine for a website design workflow
//!
//! Drives a project from a prompt through sitemap, wireframes and a style
//! guide. Artifacts come from an external generation service; this crate
//! owns the workflow, the artifact store, history, diagnostics and
//! persistence.

pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod session;

pub use config::BuilderConfig;
pub use error::{AppError, Result};
pub use session::{Session, SessionEvent};
