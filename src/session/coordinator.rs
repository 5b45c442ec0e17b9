//! Generic generation coordinator, one instance per artifact kind.
//!
//! Lifecycle: idle → generating → {success, error}. A later `generate`
//! re-enters generating from any terminal status. Only one generation per
//! kind may be in flight; the guard is an atomic compare-and-set taken
//! before any state changes.

use super::state::SessionState;
use super::{Session, SessionEvent};
use crate::domain::{
    is_hex_color, ArtifactKind, DiagnosticCode, GenerationState, HistoryAction, Severity,
    SitemapStructure, StyleGuide, Wireframe, PROGRESS_RESPONSE_RECEIVED,
};
use crate::error::{AppError, GenerationError, GenerationResult, Result};
use crate::services::GenerationRequest;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Binds an artifact kind to its decoded type and how it is stored
pub trait ArtifactSpec: Send + Sync + 'static {
    const KIND: ArtifactKind;
    const ACTION: HistoryAction;

    type Artifact: DeserializeOwned + Send;

    /// Decode and sanity-check the service's artifact document
    fn decode(value: Value) -> GenerationResult<Self::Artifact> {
        serde_json::from_value(value).map_err(|e| GenerationError::InvalidArtifact(e.to_string()))
    }

    /// Put the artifact into the store, replacing any previous one.
    /// Returns the history description.
    fn install(
        state: &mut SessionState,
        request: &GenerationRequest,
        artifact: Self::Artifact,
    ) -> String;
}

pub struct SitemapArtifact;

impl ArtifactSpec for SitemapArtifact {
    const KIND: ArtifactKind = ArtifactKind::Sitemap;
    const ACTION: HistoryAction = HistoryAction::SitemapGenerated;
    type Artifact = SitemapStructure;

    fn decode(value: Value) -> GenerationResult<SitemapStructure> {
        let sitemap: SitemapStructure = serde_json::from_value(value)
            .map_err(|e| GenerationError::InvalidArtifact(e.to_string()))?;
        sitemap
            .ensure_unique_ids()
            .map_err(|e| GenerationError::InvalidArtifact(e.to_string()))?;
        Ok(sitemap)
    }

    fn install(state: &mut SessionState, _request: &GenerationRequest, mut sitemap: SitemapStructure) -> String {
        sitemap.normalize_parents();
        sitemap.generated_at.get_or_insert_with(Utc::now);
        let description = format!("Generated sitemap with {} pages", sitemap.page_count());
        state.artifacts.sitemap = Some(sitemap);
        description
    }
}

pub struct WireframeArtifact;

impl ArtifactSpec for WireframeArtifact {
    const KIND: ArtifactKind = ArtifactKind::Wireframe;
    const ACTION: HistoryAction = HistoryAction::WireframeGenerated;
    type Artifact = Wireframe;

    fn install(state: &mut SessionState, request: &GenerationRequest, mut wireframe: Wireframe) -> String {
        if let Some(page_id) = request.page_id() {
            wireframe.page_id = page_id.to_string();
        }
        wireframe.updated_at = Utc::now();
        let description = format!("Generated wireframe for page {}", wireframe.page_id);
        state
            .artifacts
            .wireframes
            .insert(wireframe.page_id.clone(), wireframe);
        description
    }
}

pub struct StyleArtifact;

impl ArtifactSpec for StyleArtifact {
    const KIND: ArtifactKind = ArtifactKind::Style;
    const ACTION: HistoryAction = HistoryAction::StyleGenerated;
    type Artifact = StyleGuide;

    fn decode(value: Value) -> GenerationResult<StyleGuide> {
        let guide: StyleGuide = serde_json::from_value(value)
            .map_err(|e| GenerationError::InvalidArtifact(e.to_string()))?;
        if let Some((name, token)) = guide
            .color_palette
            .iter()
            .find(|(_, t)| !is_hex_color(&t.value))
        {
            return Err(GenerationError::InvalidArtifact(format!(
                "color '{}' has invalid value '{}'",
                name, token.value
            )));
        }
        Ok(guide)
    }

    fn install(state: &mut SessionState, _request: &GenerationRequest, guide: StyleGuide) -> String {
        let description = format!(
            "Generated style guide with {} colors",
            guide.color_palette.len()
        );
        state.artifacts.style_guide = Some(guide);
        description
    }
}

/// Releases the in-flight flag when the generation ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Coordinator<K: ArtifactSpec> {
    in_flight: AtomicBool,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ArtifactSpec> Default for Coordinator<K> {
    fn default() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            _kind: PhantomData,
        }
    }
}

impl<K: ArtifactSpec> Coordinator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Run one generation. Service failures are recorded on the session and
    /// do not surface as `Err`; the only error is a rejected concurrent call.
    ///
    /// If the project is created, loaded, imported or reset while the service
    /// is working, the result belongs to a store that no longer exists and is
    /// discarded.
    pub async fn generate(&self, session: &Session, request: GenerationRequest) -> Result<()> {
        let kind = K::KIND;
        let Some(flight) = self.acquire() else {
            tracing::warn!("Rejected {} generation: already in progress", kind);
            return Err(AppError::AlreadyGenerating(kind));
        };

        let epoch = session.update(|state| {
            state
                .generation
                .get_mut(kind)
                .begin(format!("Generating {}", kind));
            state.last_prompts.insert(kind, request.prompt.clone());
            state.epoch()
        });
        session.emit(SessionEvent::GenerationStarted { kind });
        tracing::info!("Generating {} for prompt {:?}", kind, request.prompt);

        let outcome = match session.service().generate_artifact(&request).await {
            Ok(response) => {
                session.update(|state| {
                    if state.epoch() == epoch {
                        state
                            .generation
                            .get_mut(kind)
                            .advance(PROGRESS_RESPONSE_RECEIVED, "Processing response");
                    }
                });
                K::decode(response.artifact).map(|artifact| (artifact, response.metadata))
            }
            Err(e) => Err(e),
        };

        let settled = session.update(|state| {
            let settled = if state.epoch() != epoch {
                *state.generation.get_mut(kind) = GenerationState::default();
                Settled::Stale
            } else {
                match outcome {
                    Ok((artifact, metadata)) => {
                        let description = K::install(state, &request, artifact);
                        state.generation.get_mut(kind).succeed(metadata.confidence);
                        state.record(
                            K::ACTION,
                            description,
                            Some(json!({
                                "prompt": request.prompt,
                                "confidence": metadata.confidence,
                                "processingTimeMs": metadata.processing_time_ms,
                                "tokensUsed": metadata.tokens_used,
                            })),
                        );
                        state.complete_step(kind.step());
                        Settled::Installed(metadata.processing_time_ms)
                    }
                    Err(error) => {
                        let message = error.to_string();
                        state.generation.get_mut(kind).fail(message.clone());
                        state.diagnostics.add_error(
                            DiagnosticCode::GenerationFailed,
                            format!("{} generation failed: {}", kind, message),
                            Severity::High,
                            kind.step(),
                            Some(json!({ "prompt": request.prompt, "page": request.page_id() })),
                        );
                        Settled::Failed(message)
                    }
                }
            };
            // Status and the in-flight flag change under the same lock
            drop(flight);
            settled
        });

        match settled {
            Settled::Installed(elapsed_ms) => {
                tracing::info!("{} generation succeeded in {} ms", kind, elapsed_ms);
                session.emit(SessionEvent::StepCompleted(kind.step()));
                session.emit(SessionEvent::GenerationCompleted { kind });
            }
            Settled::Failed(message) => {
                tracing::warn!("{} generation failed: {}", kind, message);
                session.emit(SessionEvent::GenerationFailed { kind, message });
            }
            Settled::Stale => {
                tracing::info!(
                    "Discarded {} generation result: the session was replaced while it ran",
                    kind
                );
            }
        }

        Ok(())
    }
}

/// How a generation ended once its result reached the store
enum Settled {
    Installed(u64),
    Failed(String),
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_single_flight() {
        let coordinator = Coordinator::<SitemapArtifact>::new();
        let first = coordinator.acquire();
        assert!(first.is_some());
        assert!(coordinator.acquire().is_none());
        assert!(coordinator.is_in_flight());

        drop(first);
        assert!(!coordinator.is_in_flight());
        assert!(coordinator.acquire().is_some());
    }

    #[test]
    fn test_style_decode_rejects_bad_colors() {
        let value = json!({
            "color_palette": { "primary": { "value": "blueish" } },
            "typography": { "heading_font": "Inter", "body_font": "Inter" }
        });
        assert!(matches!(
            StyleArtifact::decode(value),
            Err(GenerationError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_sitemap_decode_rejects_wrong_shape() {
        assert!(SitemapArtifact::decode(json!({ "pages": "none" })).is_err());
        assert!(SitemapArtifact::decode(json!({ "pages": [] })).is_ok());
    }

    #[test]
    fn test_sitemap_decode_rejects_duplicate_ids() {
        let value = json!({
            "pages": [
                { "id": "home", "title": "Home", "path": "/", "priority": 10 },
                { "id": "home", "title": "Home again", "path": "/home", "priority": 5 }
            ]
        });
        assert!(matches!(
            SitemapArtifact::decode(value),
            Err(GenerationError::InvalidArtifact(msg)) if msg.contains("home")
        ));
    }
}
