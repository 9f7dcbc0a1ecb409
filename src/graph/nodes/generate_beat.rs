//! `generate_beat` (spec §4.5 step 2).

use async_trait::async_trait;

use crate::event_bus::EngineEvent;
use crate::generator::{GenerationOverrides, NcpAwareGenerator};
use crate::graph::node::{GraphState, Node, NodeContext, NodeError};
use crate::types::NodeKind;

/// Invokes the NCP-Aware Generator, appends the resulting beat, and
/// transitions to `analyze_beat`.
pub struct GenerateBeatNode {
    generator: NcpAwareGenerator,
}

impl GenerateBeatNode {
    #[must_use]
    pub fn new(generator: NcpAwareGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Node for GenerateBeatNode {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError> {
        if state.regenerating {
            state.ncp.beats.pop();
            state.ncp.current_beat_index = state.ncp.beats.len() as u32;
            state.regenerating = false;
        } else {
            state.regeneration_attempts = 0;
        }

        let theme = state.theme.clone();
        let beat = self
            .generator
            .generate_beat(
                &mut state.ncp,
                &mut state.tracker,
                &state.prompt,
                GenerationOverrides {
                    character_id: Some(state.player_id.clone()),
                    character_name: None,
                    theme,
                    emotional_target: None,
                },
            )
            .await;

        ctx.emit(
            &state.session_id,
            state.story_id.clone(),
            EngineEvent::BeatGenerated {
                beat_index: beat.beat_index,
                character_id: beat.character_id.clone(),
            },
        )?;

        state.next_node = Some(NodeKind::AnalyzeBeat);
        Ok(())
    }
}
