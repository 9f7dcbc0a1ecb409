//! [`GraphRunner`]: the single-threaded cooperative dispatch loop (spec §4.5, §5).

use std::sync::Arc;
use std::time::Instant;

use futures_util::Stream;
use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::event_bus::EventEmitter;
use crate::graph::node::{new_trace_id, GraphState, Node, NodeContext, NodeError, NodeResult, NodeStatus};
use crate::model::StoryBeat;
use crate::types::NodeKind;

/// A run's node budget guard against a misconfigured custom node cycling
/// forever. The happy path always terminates via `max_beats`; this is a
/// backstop at the orchestrator boundary.
const MAX_STEPS: u64 = 10_000;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GraphError {
    #[error("node '{0}' has no registered implementation")]
    #[diagnostic(code(narrative_engine::graph::unknown_node))]
    UnknownNode(String),

    #[error("node '{node}' failed: {source}")]
    #[diagnostic(code(narrative_engine::graph::node_failed))]
    NodeFailed { node: String, source: NodeError },

    #[error("graph run exceeded {0} steps without reaching output")]
    #[diagnostic(code(narrative_engine::graph::step_limit))]
    StepLimitExceeded(u64),
}

/// Executes a fixed set of nodes, following each node's `next_node`
/// directive until `output` (or a failure) is reached. One node runs to
/// completion at a time; there is no barrier merge and no intra-graph
/// parallelism (spec §5).
pub struct GraphRunner {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    config: Arc<EngineConfig>,
    event_emitter: Arc<dyn EventEmitter>,
}

impl GraphRunner {
    #[must_use]
    pub fn new(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        config: Arc<EngineConfig>,
        event_emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            nodes,
            config,
            event_emitter,
        }
    }

    /// Execute whichever node `state.next_node` names, recording a
    /// [`NodeResult`]. Returns the kind that ran, or `None` once the graph
    /// has no further node to dispatch (spec §4.5 "an unknown next_node
    /// terminates execution with a logged error" is surfaced as `Err`
    /// instead, the idiomatic Rust rendering of "logged error").
    async fn execute_current(&self, state: &mut GraphState, step: u64) -> Result<Option<NodeKind>, GraphError> {
        let Some(kind) = state.next_node.clone() else {
            return Ok(None);
        };

        let node_id = kind.encode();
        let node = self
            .nodes
            .get(&kind)
            .ok_or_else(|| GraphError::UnknownNode(node_id.clone()))?;

        let ctx = NodeContext {
            node_id: node_id.clone(),
            step,
            trace_id: new_trace_id(),
            config: Arc::clone(&self.config),
            event_emitter: Arc::clone(&self.event_emitter),
        };

        let started = Instant::now();
        let outcome = node.run(state, &ctx).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                state.node_results.push(NodeResult {
                    node_id: node_id.clone(),
                    status: NodeStatus::Ok,
                    output: None,
                    error: None,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                Ok(Some(kind))
            }
            Err(error) => {
                state.node_results.push(NodeResult {
                    node_id: node_id.clone(),
                    status: NodeStatus::Failed,
                    output: None,
                    error: Some(error.to_string()),
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                state.should_continue = false;
                Err(GraphError::NodeFailed {
                    node: node_id,
                    source: error,
                })
            }
        }
    }

    /// Run to completion, returning the final [`GraphState`] (spec §4.5
    /// "Run modes": `run(prompt, context?, session_id?)`).
    pub async fn run(&self, mut state: GraphState) -> Result<GraphState, GraphError> {
        let mut step = 0u64;
        loop {
            if step >= MAX_STEPS {
                return Err(GraphError::StepLimitExceeded(MAX_STEPS));
            }
            match self.execute_current(&mut state, step).await? {
                Some(_) => step += 1,
                None => break,
            }
        }
        Ok(state)
    }

    /// Run to completion, yielding each newly generated or re-analyzed beat
    /// as soon as the node that produced it finishes (spec §4.5 "Run
    /// modes": `stream(...)`).
    pub fn stream(self: Arc<Self>, mut state: GraphState) -> impl Stream<Item = StoryBeat> {
        async_stream::stream! {
            let mut step = 0u64;
            loop {
                if step >= MAX_STEPS {
                    break;
                }
                match self.execute_current(&mut state, step).await {
                    Ok(Some(kind)) => {
                        step += 1;
                        if matches!(kind, NodeKind::GenerateBeat | NodeKind::AnalyzeBeat) {
                            if let Some(beat) = state.ncp.last_beat() {
                                yield beat.clone();
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::TracingEventEmitter;
    use crate::graph::builder::GraphBuilder;
    use crate::llm::SyncLlmAdapter;
    use futures_util::StreamExt;

    fn llm_always_hopeful() -> Arc<dyn crate::llm::LlmAdapter> {
        Arc::new(SyncLlmAdapter::new("test", |prompt: &str| {
            if prompt.contains("Classify") {
                Ok("PRIMARY_EMOTION: hope\nCONFIDENCE: 0.9\nRESONANCE: 0.9\nSPECIFICITY: 0.9\nAUTHENTICITY: 0.9".to_string())
            } else {
                Ok("<dialogue>Stay with me.</dialogue><emotional_tone>resolution</emotional_tone>".to_string())
            }
        }))
    }

    #[tokio::test]
    async fn run_terminates_within_max_beats() {
        let runner = GraphBuilder::new(llm_always_hopeful())
            .with_config(EngineConfig::builder().max_beats(3).build())
            .with_event_emitter(Arc::new(TracingEventEmitter))
            .build();
        let state = GraphState::new("begin the story", "p1", "s1");

        let final_state = runner.run(state).await.unwrap();

        assert!(!final_state.should_continue);
        assert!(final_state.ncp.current_beat_index >= 1);
        assert!(final_state.ncp.current_beat_index <= 3);
    }

    #[tokio::test]
    async fn stream_yields_at_least_one_beat() {
        let runner = Arc::new(
            GraphBuilder::new(llm_always_hopeful())
                .with_config(EngineConfig::builder().max_beats(2).build())
                .build(),
        );
        let state = GraphState::new("begin the story", "p1", "s1");

        let beats: Vec<_> = runner.stream(state).collect().await;
        assert!(!beats.is_empty());
    }
}
