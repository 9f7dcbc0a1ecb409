//! `ncp_load` (spec §4.5 step 1).

use async_trait::async_trait;

use crate::event_bus::EngineEvent;
use crate::graph::node::{GraphState, Node, NodeContext, NodeError};
use crate::types::NodeKind;

/// Ensures `NCPState` exists (it is always created eagerly by
/// [`GraphState::new`]) and transitions straight to `generate_beat`.
#[derive(Default)]
pub struct NcpLoadNode;

#[async_trait]
impl Node for NcpLoadNode {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError> {
        if state.player_id.is_empty() {
            return Err(NodeError::MissingInput { what: "player_id" });
        }
        ctx.emit(&state.session_id, state.story_id.clone(), EngineEvent::StoryStarted)?;
        state.next_node = Some(NodeKind::GenerateBeat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::event_bus::TracingEventEmitter;
    use std::sync::Arc;

    fn ctx() -> NodeContext {
        NodeContext {
            node_id: "ncp_load".to_string(),
            step: 0,
            trace_id: "t".to_string(),
            config: Arc::new(EngineConfig::default()),
            event_emitter: Arc::new(TracingEventEmitter),
        }
    }

    #[tokio::test]
    async fn routes_to_generate_beat() {
        let mut state = GraphState::new("continue the story", "p1", "s1");
        NcpLoadNode.run(&mut state, &ctx()).await.unwrap();
        assert_eq!(state.next_node, Some(NodeKind::GenerateBeat));
    }

    #[tokio::test]
    async fn missing_player_id_fails() {
        let mut state = GraphState::new("continue the story", "", "s1");
        assert!(NcpLoadNode.run(&mut state, &ctx()).await.is_err());
    }
}
