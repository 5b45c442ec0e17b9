//! Shared fixtures for integration tests: a scripted generator and helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sitewright::domain::ArtifactKind;
use sitewright::error::{GenerationError, GenerationResult};
use sitewright::services::{
    GenerationMetadata, GenerationRequest, GenerationResponse, GenerationService, MemoryStore,
};
use sitewright::{BuilderConfig, Session};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Generator that answers from a per-kind script, falling back to fixed
/// artifacts. Optionally blocks every call until the gate is opened.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<HashMap<ArtifactKind, VecDeque<GenerationResult<Value>>>>,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls wait for `gate.notify_one()` before answering
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Queue the next answer for `kind`
    pub fn push(&self, kind: ArtifactKind, outcome: GenerationResult<Value>) {
        self.script
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(outcome);
    }

    pub fn fail_next(&self, kind: ArtifactKind, message: &str) {
        self.push(kind, Err(GenerationError::Rejected(message.to_string())));
    }

    /// Notified once each time a call reaches the generator
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate_artifact(
        &self,
        request: &GenerationRequest,
    ) -> GenerationResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(&request.kind)
            .and_then(VecDeque::pop_front);
        let artifact = match scripted {
            Some(outcome) => outcome?,
            None => default_artifact(request),
        };

        Ok(GenerationResponse {
            artifact,
            metadata: GenerationMetadata {
                confidence: 0.9,
                processing_time_ms: 5,
                tokens_used: 100,
            },
        })
    }
}

fn default_artifact(request: &GenerationRequest) -> Value {
    match request.kind {
        ArtifactKind::Sitemap => acme_sitemap(),
        ArtifactKind::Wireframe => wireframe_for(request.page_id().unwrap_or("home")),
        ArtifactKind::Style => acme_style(),
    }
}

/// home, about (team), contact
pub fn acme_sitemap() -> Value {
    json!({
        "pages": [
            { "id": "home", "title": "Home", "path": "/", "priority": 10 },
            {
                "id": "about", "title": "About", "path": "/about", "priority": 7,
                "children": [
                    { "id": "team", "title": "Team", "path": "/about/team", "priority": 5 }
                ]
            },
            { "id": "contact", "title": "Contact", "path": "/contact", "priority": 6 }
        ],
        "base_url": "https://acme.test"
    })
}

pub fn small_sitemap() -> Value {
    json!({
        "pages": [
            { "id": "home", "title": "Home", "path": "/", "priority": 10 }
        ]
    })
}

pub fn wireframe_for(page_id: &str) -> Value {
    json!({
        "id": format!("wf-{}", page_id),
        "name": format!("{} layout", page_id),
        "layout": "single-column",
        "components": [
            { "id": "hero", "type": "hero", "name": "Hero" },
            { "id": "footer", "type": "footer", "name": "Footer" }
        ]
    })
}

pub fn acme_style() -> Value {
    json!({
        "color_palette": {
            "primary": { "value": "#2563eb", "usage": "buttons" },
            "background": { "value": "#ffffff" }
        },
        "typography": { "heading_font": "Inter", "body_font": "Inter" },
        "spacing": { "md": "16px" }
    })
}

pub fn session_with(generator: Arc<ScriptedGenerator>) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = Session::new(generator, store.clone(), &BuilderConfig::default());
    (session, store)
}
