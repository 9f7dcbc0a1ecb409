//! `should_continue` (spec §4.5 step 4).

use async_trait::async_trait;

use crate::graph::node::{GraphState, Node, NodeContext, NodeError};
use crate::types::NodeKind;

const TERMINAL_TONES: &[&str] = &["resolution", "conclusion", "ending"];

/// Terminal check: ends the run once the beat budget is spent or the story
/// has reached a concluding emotional beat at adequate quality.
#[derive(Default)]
pub struct ShouldContinueNode;

#[async_trait]
impl Node for ShouldContinueNode {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError> {
        let reached_budget = state.ncp.current_beat_index >= ctx.config.max_beats;

        let reached_resolution = state.ncp.last_beat().is_some_and(|beat| {
            let tone_is_terminal = beat
                .emotional_tone
                .as_deref()
                .map(str::to_lowercase)
                .is_some_and(|tone| TERMINAL_TONES.iter().any(|t| tone.contains(t)));
            tone_is_terminal && beat.quality_score >= ctx.config.min_quality
        });

        state.next_node = Some(if reached_budget || reached_resolution {
            NodeKind::Output
        } else {
            NodeKind::GenerateBeat
        });

        Ok(())
    }
}
