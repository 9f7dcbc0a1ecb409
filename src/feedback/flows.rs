//! Remediation flow routing (spec §4.3 "Remediation pipeline", "Extensibility").

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::enrichment::EmotionalBeatEnricher;
use crate::model::{Gap, StoryBeat};
use crate::types::GapType;

/// The result a flow handler produces for one gap (spec §4.3).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Enrichment {
    pub applied: bool,
    pub content: Option<String>,
    pub improvement_score: f64,
}

impl Enrichment {
    #[must_use]
    pub fn not_applied() -> Self {
        Self::default()
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Enrichment> + Send>>;

/// A pluggable remediation callable (spec §4.3: "handlers are pluggable
/// callables").
pub type FlowHandler = Arc<dyn Fn(&StoryBeat, &Gap) -> HandlerFuture + Send + Sync>;

/// A named, prioritized remediation route for one or more gap types.
#[derive(Clone)]
pub struct FlowRoute {
    pub flow_id: String,
    pub gap_types: Vec<GapType>,
    pub priority: u8,
    pub handler: FlowHandler,
}

impl FlowRoute {
    #[must_use]
    pub fn new(
        flow_id: impl Into<String>,
        gap_types: Vec<GapType>,
        priority: u8,
        handler: FlowHandler,
    ) -> Self {
        Self {
            flow_id: flow_id.into(),
            gap_types,
            priority,
            handler,
        }
    }
}

fn default_handler() -> FlowHandler {
    Arc::new(|_beat: &StoryBeat, _gap: &Gap| -> HandlerFuture { Box::pin(async { Enrichment::not_applied() }) })
}

/// Instance-scoped registry of remediation routes. One registry is created
/// per engine instance (spec §9, Design Notes: "not a process-wide
/// singleton") so separate graph runs can carry independently tuned flows.
pub struct FlowRegistry {
    routes: Vec<FlowRoute>,
}

impl FlowRegistry {
    /// The six default routes from the gap taxonomy table (spec §4.3). Each
    /// default handler declines to enrich (`applied: false`); a host engine
    /// that wants real remediation registers its own handler for a flow id,
    /// which replaces the default ordering but keeps the same gap routing.
    #[must_use]
    pub fn new_default_registry() -> Self {
        let mut registry = Self { routes: Vec::new() };
        registry.register_flow(FlowRoute::new(
            "emotional_enrichment",
            vec![GapType::EmotionalWeak, GapType::EmotionalMismatch],
            1,
            default_handler(),
        ));
        registry.register_flow(FlowRoute::new(
            "character_consistency",
            vec![GapType::CharacterInconsistent],
            2,
            default_handler(),
        ));
        registry.register_flow(FlowRoute::new(
            "character_development",
            vec![GapType::CharacterStatic],
            3,
            default_handler(),
        ));
        registry.register_flow(FlowRoute::new(
            "thematic_weaving",
            vec![GapType::ThemeMissing, GapType::ThemeContradiction],
            4,
            default_handler(),
        ));
        registry.register_flow(FlowRoute::new(
            "dialogue_enhancement",
            vec![GapType::DialogueWeak],
            5,
            default_handler(),
        ));
        registry.register_flow(FlowRoute::new(
            "pacing_adjustment",
            vec![GapType::PacingIssue],
            6,
            default_handler(),
        ));
        registry
    }

    /// Same six default routes as [`Self::new_default_registry`], except
    /// `emotional_enrichment` is wired to actually invoke
    /// [`EmotionalBeatEnricher::analyze_and_enrich`] instead of declining
    /// every gap (spec §4.3: "Remediation may call back into the emotional
    /// enricher … bounded by a quality threshold and iteration cap"). This is
    /// the registry [`crate::graph::GraphBuilder`] installs by default.
    #[must_use]
    pub fn new_default_registry_with_enricher(
        enricher: Arc<EmotionalBeatEnricher>,
        quality_threshold: f64,
        max_iterations: u32,
        min_improvement: f64,
        length_tolerance: f64,
    ) -> Self {
        let mut registry = Self::new_default_registry();
        let handler: FlowHandler = Arc::new(move |beat: &StoryBeat, _gap: &Gap| -> HandlerFuture {
            let enricher = Arc::clone(&enricher);
            let beat = beat.clone();
            Box::pin(async move {
                match enricher
                    .analyze_and_enrich(&beat, quality_threshold, max_iterations, min_improvement, length_tolerance)
                    .await
                {
                    Ok(result) if result.was_enriched => Enrichment {
                        applied: true,
                        content: Some(result.r#final.raw_text),
                        improvement_score: result.improvement_delta.max(0.0),
                    },
                    _ => Enrichment::not_applied(),
                }
            })
        });
        registry.register_flow(FlowRoute::new(
            "emotional_enrichment",
            vec![GapType::EmotionalWeak, GapType::EmotionalMismatch],
            1,
            handler,
        ));
        registry
    }

    /// Add a route and re-sort by ascending priority (spec §4.3
    /// "Extensibility": `register_flow` adds a new route and resorts by
    /// priority). A route with a `flow_id` already present replaces it
    /// rather than shadowing it, so a host overriding a default flow doesn't
    /// leave the old handler reachable.
    pub fn register_flow(&mut self, route: FlowRoute) {
        self.routes.retain(|r| r.flow_id != route.flow_id);
        self.routes.push(route);
        self.routes.sort_by_key(|r| r.priority);
    }

    /// The lowest-priority route whose `gap_types` includes `gap_type`.
    #[must_use]
    pub fn route_for(&self, gap_type: GapType) -> Option<&FlowRoute> {
        self.routes.iter().find(|route| route.gap_types.contains(&gap_type))
    }
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::new_default_registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_routes_every_gap_type() {
        let registry = FlowRegistry::new_default_registry();
        for gap_type in [
            GapType::EmotionalWeak,
            GapType::EmotionalMismatch,
            GapType::CharacterInconsistent,
            GapType::CharacterStatic,
            GapType::ThemeMissing,
            GapType::ThemeContradiction,
            GapType::DialogueWeak,
            GapType::PacingIssue,
        ] {
            assert!(registry.route_for(gap_type).is_some());
        }
    }

    #[test]
    fn register_flow_keeps_routes_sorted_by_priority() {
        let mut registry = FlowRegistry::new_default_registry();
        registry.register_flow(FlowRoute::new(
            "urgent_override",
            vec![GapType::PacingIssue],
            0,
            default_handler(),
        ));
        assert_eq!(registry.routes[0].flow_id, "urgent_override");
    }

    #[test]
    fn register_flow_replaces_existing_flow_id_instead_of_shadowing() {
        let mut registry = FlowRegistry::new_default_registry();
        let before = registry.routes.len();
        registry.register_flow(FlowRoute::new(
            "emotional_enrichment",
            vec![GapType::EmotionalWeak],
            9,
            default_handler(),
        ));
        assert_eq!(registry.routes.len(), before);
        assert_eq!(
            registry.routes.iter().filter(|r| r.flow_id == "emotional_enrichment").count(),
            1
        );
    }

    #[tokio::test]
    async fn wired_emotional_enrichment_invokes_the_enricher() {
        use crate::llm::SyncLlmAdapter;
        use crate::model::StoryBeat;
        use std::sync::Mutex;

        let responses = Arc::new(Mutex::new(vec![
            "PRIMARY_EMOTION_SCORE: flat\nCONFIDENCE_SCORE: 0.3\nRESONANCE_SCORE: 0.3\n\
             SPECIFICITY_SCORE: 0.3\nAUTHENTICITY_SCORE: 0.3"
                .to_string(),
            "a slightly longer and more vivid rewrite of the same passage".to_string(),
            "PRIMARY_EMOTION: hope\nCONFIDENCE: 0.9\nRESONANCE: 0.9\nSPECIFICITY: 0.9\nAUTHENTICITY: 0.9"
                .to_string(),
        ]));
        let llm = Arc::new(SyncLlmAdapter::new("scripted", move |_: &str| {
            let mut queue = responses.lock().unwrap();
            Ok(if queue.len() > 1 { queue.remove(0) } else { queue[0].clone() })
        }));
        let enricher = Arc::new(EmotionalBeatEnricher::new(llm));
        let registry = FlowRegistry::new_default_registry_with_enricher(enricher, 0.75, 3, 0.05, 0.5);

        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "a short passage".to_string();
        let gap = Gap::new(
            GapType::EmotionalWeak,
            0.3,
            0.7,
            "weak".to_string(),
            vec![],
            beat.beat_id,
        );

        let route = registry.route_for(GapType::EmotionalWeak).unwrap();
        let enrichment = (route.handler)(&beat, &gap).await;
        assert!(enrichment.applied);
        assert!(enrichment.content.is_some());
    }
}
