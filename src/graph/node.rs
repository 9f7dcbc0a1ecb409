//! The [`Node`] trait, [`NodeContext`], and [`GraphState`] (spec §4.5, §5).
//!
//! The trait shape (`run(&self, state, ctx) -> Result<(), NodeError>`),
//! `NodeContext` carrying step/event-emitter metadata, and a per-subsystem
//! error enum follow the orchestrator conventions laid out in §4.5 and §5:
//! each node mutates a single `&mut GraphState` directly, since single-
//! threaded cooperative dispatch has no concurrent barrier step to reduce
//! partial results into.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::character_arc::CharacterArcTracker;
use crate::config::EngineConfig;
use crate::event_bus::{EngineEvent, EmitterError, EventEmitter, TracedEvent};
use crate::model::NCPState;
use crate::types::NodeKind;

#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("missing expected input: {what}")]
    #[diagnostic(code(narrative_engine::node::missing_input))]
    MissingInput { what: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generator(#[from] crate::generator::GeneratorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enricher(#[from] crate::enrichment::EnricherError),

    #[error("unknown next node: {0}")]
    #[diagnostic(code(narrative_engine::node::unknown_next))]
    UnknownNextNode(String),

    #[error("event emission failed")]
    #[diagnostic(code(narrative_engine::node::event_emit))]
    EventEmit(#[from] EmitterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Feedback(#[from] crate::feedback::FeedbackLoopError),
}

/// One run's execution record for a single node invocation (spec §4.5
/// "Maintains `node_results` append log").
#[derive(Clone, Debug)]
pub struct NodeResult {
    pub node_id: String,
    pub status: NodeStatus,
    pub output: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Ok,
    Failed,
}

/// Everything a graph run threads between node executions: the narrative
/// state plus orchestration bookkeeping.
pub struct GraphState {
    pub ncp: NCPState,
    pub tracker: CharacterArcTracker,
    pub next_node: Option<NodeKind>,
    pub should_continue: bool,
    pub node_results: Vec<NodeResult>,
    pub prompt: String,
    pub theme: Option<String>,
    pub player_id: String,
    pub session_id: String,
    pub story_id: Option<String>,
    /// Set by `analyze_beat` when it routes back to `generate_beat` for a
    /// from-scratch regeneration (spec §4.5 step 3). `generate_beat` checks
    /// this to drop the rejected beat before appending the replacement, so a
    /// regeneration never grows `beats.len()` (spec §8 scenario 3).
    pub regenerating: bool,
    /// Regeneration attempts spent on the beat currently in flight, reset to
    /// `0` whenever `generate_beat` produces a genuinely new beat rather than
    /// regenerating one. Bounds regeneration to at most
    /// `MAX_REGENERATION_ATTEMPTS` per beat (spec §8: "enrichments_applied …
    /// bounded by 3"), independent of `ncp.enrichment_count`, which is a
    /// whole-story cumulative total and must not gate a single beat's retries.
    pub regeneration_attempts: u32,
}

impl GraphState {
    #[must_use]
    pub fn new(prompt: impl Into<String>, player_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            ncp: NCPState::new(),
            tracker: CharacterArcTracker::new(),
            next_node: Some(NodeKind::NcpLoad),
            should_continue: true,
            node_results: Vec::new(),
            prompt: prompt.into(),
            theme: None,
            player_id: player_id.into(),
            session_id: session_id.into(),
            story_id: None,
            regenerating: false,
            regeneration_attempts: 0,
        }
    }
}

/// Execution context passed to every node (spec §4.5).
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: String,
    pub step: u64,
    pub trace_id: String,
    pub config: Arc<EngineConfig>,
    pub event_emitter: Arc<dyn EventEmitter>,
}

impl NodeContext {
    pub fn emit(&self, session_id: &str, story_id: Option<String>, event: EngineEvent) -> Result<(), EmitterError> {
        self.event_emitter.emit(TracedEvent {
            trace_id: self.trace_id.clone(),
            session_id: session_id.to_string(),
            story_id,
            event,
        })
    }
}

/// A single unit of graph work (spec §4.5's node set).
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, state: &mut GraphState, ctx: &NodeContext) -> Result<(), NodeError>;
}

#[must_use]
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}
