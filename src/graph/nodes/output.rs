//! `output` (spec §4.5 step 5).

use async_trait::async_trait;

use crate::event_bus::EngineEvent;
use crate::graph::node::{GraphState, Node, NodeContext, NodeError};

/// Finalizes the run: clears `should_continue` and emits the summary event.
#[derive(Default)]
pub struct OutputNode;

#[async_trait]
impl Node for OutputNode {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError> {
        state.should_continue = false;
        ctx.emit(
            &state.session_id,
            state.story_id.clone(),
            EngineEvent::StoryCompleted {
                beat_count: state.ncp.current_beat_index,
            },
        )?;
        state.next_node = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::event_bus::TracingEventEmitter;
    use std::sync::Arc;

    #[tokio::test]
    async fn clears_should_continue_and_next_node() {
        let ctx = NodeContext {
            node_id: "output".to_string(),
            step: 0,
            trace_id: "t".to_string(),
            config: Arc::new(EngineConfig::default()),
            event_emitter: Arc::new(TracingEventEmitter),
        };
        let mut state = GraphState::new("continue", "p1", "s1");

        OutputNode.run(&mut state, &ctx).await.unwrap();

        assert!(!state.should_continue);
        assert_eq!(state.next_node, None);
    }
}
