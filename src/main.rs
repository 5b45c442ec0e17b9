//! sitewright: run the design workflow for one project from the command line
//!
//! Usage: `sitewright <project-name> <prompt...>`
//!
//! Generates a sitemap, a wireframe for every page and a style guide through
//! the configured generator command, saves the project and prints the XML
//! sitemap.

use anyhow::{bail, Context, Result};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitewright::domain::{ArtifactKind, GenerationStatus, WebsiteType};
use sitewright::services::{JsonFileStore, RpcGenerationService, SitemapFormat};
use sitewright::{BuilderConfig, Session};

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Fail with the recorded error if the last generation of `kind` did not succeed
fn check_generation(session: &Session, kind: ArtifactKind) -> Result<()> {
    let state = session.generation_state(kind);
    if state.status != GenerationStatus::Success {
        bail!(
            "{} generation failed: {}",
            kind,
            state.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

async fn run(session: &Session, prompt: &str) -> Result<String> {
    session.generate_sitemap(prompt).await?;
    check_generation(session, ArtifactKind::Sitemap)?;

    let page_ids: Vec<String> = session
        .sitemap()
        .map(|s| s.pages_depth_first().into_iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default();
    for page_id in &page_ids {
        session.generate_wireframe(page_id, prompt).await?;
        check_generation(session, ArtifactKind::Wireframe)?;
    }

    session.generate_style(prompt).await?;
    check_generation(session, ArtifactKind::Style)?;

    session.save()?;
    Ok(session.export_sitemap(SitemapFormat::Xml)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let name = args.next().context("usage: sitewright <project-name> <prompt...>")?;
    let prompt = args.collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        bail!("usage: sitewright <project-name> <prompt...>");
    }

    let project_root = std::env::current_dir().ok();
    let config = BuilderConfig::load(project_root.as_deref())?;
    if !config.generation.is_configured() {
        bail!("no generator configured; set generation.command in .sitewright.toml");
    }

    let store = JsonFileStore::from_config(&config.storage)?;
    tracing::info!("Storing projects in {:?}", store.directory());
    let service = RpcGenerationService::from_config(&config.generation);
    let session = Session::new(Arc::new(service), Arc::new(store), &config);

    let project_id = session.create_project(&name, &prompt, WebsiteType::Other);
    tracing::info!("Starting sitewright for project {}", project_id);

    // Run with Ctrl+C signal handling
    let result = tokio::select! {
        res = run(&session, &prompt) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
            return Ok(());
        }
    };

    let xml = result?;
    print!("{}", xml);
    eprintln!("Saved project {}", project_id);
    Ok(())
}
