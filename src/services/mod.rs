//! Outbound boundaries of the engine.
//!
//! This module contains:
//! - GenerationService: the external artifact generator, plus a JSON-RPC
//!   subprocess implementation
//! - PersistenceAdapter: snapshot storage on disk or in memory
//! - Export encoders for sitemaps and style guides

pub mod export;
mod generation;
mod persistence;
pub mod rpc;

pub use export::{export_sitemap, export_style_guide, parse_sitemap_json, SitemapFormat, StyleFormat};
pub use generation::{GenerationMetadata, GenerationRequest, GenerationResponse, GenerationService};
pub use persistence::{
    JsonFileStore, MemoryStore, PersistenceAdapter, SessionDocument, SessionSnapshot,
    SESSION_FORMAT_VERSION,
};
pub use rpc::RpcGenerationService;
