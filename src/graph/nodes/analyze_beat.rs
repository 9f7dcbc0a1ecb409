//! `analyze_beat` (spec §4.5 step 3).

use async_trait::async_trait;

use crate::enrichment::EmotionalBeatEnricher;
use crate::event_bus::EngineEvent;
use crate::feedback::AnalyticalFeedbackLoop;
use crate::graph::node::{GraphState, Node, NodeContext, NodeError};
use crate::types::NodeKind;

const LOW_QUALITY_REGENERATE_THRESHOLD: f64 = 0.5;
const MAX_REGENERATION_ATTEMPTS: u32 = 3;

/// Runs the emotional classifier and the analytical feedback loop over the
/// most recently generated beat, replaces it in place with the
/// possibly-enriched result, and routes per spec §4.5's exact thresholds.
pub struct AnalyzeBeatNode {
    enricher: EmotionalBeatEnricher,
    feedback: AnalyticalFeedbackLoop,
}

impl AnalyzeBeatNode {
    #[must_use]
    pub fn new(enricher: EmotionalBeatEnricher, feedback: AnalyticalFeedbackLoop) -> Self {
        Self { enricher, feedback }
    }
}

#[async_trait]
impl Node for AnalyzeBeatNode {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError> {
        let Some(last_beat) = state.ncp.last_beat().cloned() else {
            return Err(NodeError::MissingInput { what: "last beat" });
        };

        let analysis = self.enricher.classify(&last_beat).await?;
        let processed = self
            .feedback
            .process_beat_with_analysis(
                &last_beat,
                &analysis,
                &state.tracker,
                &state.player_id,
                state.theme.as_deref(),
                ctx.config.gap_threshold,
                ctx.config.max_gaps_per_beat,
                ctx.config.auto_remediate,
            )
            .await?;

        let remediation_gain = processed.beat.quality_score;
        let final_quality = (processed.overall_quality + remediation_gain).clamp(0.0, 1.0);

        let mut final_beat = processed.beat;
        final_beat.quality_score = final_quality;

        let applied_count = processed
            .remediation_notes
            .iter()
            .filter(|note| note.starts_with("applied "))
            .count() as u32;

        for gap in &processed.gaps {
            ctx.emit(
                &state.session_id,
                state.story_id.clone(),
                EngineEvent::GapIdentified {
                    gap_type: gap.gap_type.to_string(),
                    severity: gap.severity.to_string(),
                },
            )?;
        }

        state.ncp.identified_gaps.extend(processed.gaps);
        state.ncp.enrichment_count += applied_count;
        state.ncp.replace_last_beat(final_beat);

        ctx.emit(
            &state.session_id,
            state.story_id.clone(),
            EngineEvent::BeatAnalyzed {
                beat_index: state.ncp.current_beat_index.saturating_sub(1),
                quality_score: final_quality,
            },
        )?;

        let should_regenerate = final_quality < LOW_QUALITY_REGENERATE_THRESHOLD
            && state.regeneration_attempts < MAX_REGENERATION_ATTEMPTS;
        if should_regenerate {
            state.regeneration_attempts += 1;
        }
        state.regenerating = should_regenerate;

        state.next_node = Some(if state.ncp.current_beat_index >= ctx.config.max_beats {
            NodeKind::Output
        } else if should_regenerate {
            NodeKind::GenerateBeat
        } else {
            NodeKind::ShouldContinue
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::event_bus::TracingEventEmitter;
    use crate::llm::SyncLlmAdapter;
    use crate::model::StoryBeat;
    use std::sync::Arc;

    fn ctx(max_beats: u32) -> NodeContext {
        NodeContext {
            node_id: "analyze_beat".to_string(),
            step: 0,
            trace_id: "t".to_string(),
            config: Arc::new(EngineConfig::builder().max_beats(max_beats).build()),
            event_emitter: Arc::new(TracingEventEmitter),
        }
    }

    #[tokio::test]
    async fn routes_to_output_when_beat_budget_exhausted() {
        let llm = Arc::new(SyncLlmAdapter::new("test", |_: &str| {
            Ok("PRIMARY_EMOTION: hope\nCONFIDENCE: 0.9\nRESONANCE: 0.9\nSPECIFICITY: 0.9\nAUTHENTICITY: 0.9".to_string())
        }));
        let node = AnalyzeBeatNode::new(
            EmotionalBeatEnricher::new(llm),
            AnalyticalFeedbackLoop::new(),
        );
        let mut state = GraphState::new("continue", "p1", "s1");
        state.ncp.append_beat(StoryBeat::new(0, "p1", "Mira"));

        node.run(&mut state, &ctx(1)).await.unwrap();
        assert_eq!(state.next_node, Some(NodeKind::Output));
    }

    #[tokio::test]
    async fn routes_to_should_continue_when_quality_is_adequate() {
        let llm = Arc::new(SyncLlmAdapter::new("test", |_: &str| {
            Ok("PRIMARY_EMOTION: hope\nCONFIDENCE: 0.9\nRESONANCE: 0.9\nSPECIFICITY: 0.9\nAUTHENTICITY: 0.9".to_string())
        }));
        let node = AnalyzeBeatNode::new(
            EmotionalBeatEnricher::new(llm),
            AnalyticalFeedbackLoop::new(),
        );
        let mut state = GraphState::new("continue", "p1", "s1");
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "a fine passage".to_string();
        beat.dialogue = Some("hi".to_string());
        state.ncp.append_beat(beat);

        node.run(&mut state, &ctx(10)).await.unwrap();
        assert_eq!(state.next_node, Some(NodeKind::ShouldContinue));
    }
}
