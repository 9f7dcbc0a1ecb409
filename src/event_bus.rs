//! Trace event emission (spec §6).
//!
//! A small `Send + Sync` trait so nodes can emit without caring who's
//! listening.
//! The engine defines the keyed event taxonomy itself; the default emitter
//! turns each into a structured `tracing` call, and any external analytics
//! bridge is free to implement [`EventEmitter`] and attach its own sink
//! instead (that bridge itself remains an out-of-scope collaborator).

use std::fmt;
use thiserror::Error;

/// One of the keyed trace events the engine emits (spec §6).
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    BeatGenerated { beat_index: u32, character_id: String },
    BeatAnalyzed { beat_index: u32, quality_score: f64 },
    BeatEnriched { beat_index: u32, flow_id: String, delta: f64 },
    CharacterArcUpdated { player_id: String, arc_position: f64 },
    GapIdentified { gap_type: String, severity: String },
    GapRemediationCompleted { flow_id: String, applied: bool },
    GraphNodeStarted { node: String, step: u64 },
    GraphNodeCompleted { node: String, step: u64, duration_ms: u64 },
    StoryStarted,
    StoryCompleted { beat_count: u32 },
    StoryCheckpoint { beat_count: u32 },
}

impl EngineEvent {
    /// The dotted key used in the trace-event taxonomy, e.g. `"beat.generated"`.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            EngineEvent::BeatGenerated { .. } => "beat.generated",
            EngineEvent::BeatAnalyzed { .. } => "beat.analyzed",
            EngineEvent::BeatEnriched { .. } => "beat.enriched",
            EngineEvent::CharacterArcUpdated { .. } => "character.arc_updated",
            EngineEvent::GapIdentified { .. } => "gap.identified",
            EngineEvent::GapRemediationCompleted { .. } => "gap.remediation_completed",
            EngineEvent::GraphNodeStarted { .. } => "graph.node_started",
            EngineEvent::GraphNodeCompleted { .. } => "graph.node_completed",
            EngineEvent::StoryStarted => "story.started",
            EngineEvent::StoryCompleted { .. } => "story.completed",
            EngineEvent::StoryCheckpoint { .. } => "story.checkpoint",
        }
    }
}

/// Envelope carrying the correlation ids required on every payload.
#[derive(Clone, Debug, PartialEq)]
pub struct TracedEvent {
    pub trace_id: String,
    pub session_id: String,
    pub story_id: Option<String>,
    pub event: EngineEvent,
}

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("event bus closed")]
    Closed,
}

/// An abstract sink workflow nodes emit events to.
pub trait EventEmitter: Send + Sync + fmt::Debug {
    fn emit(&self, event: TracedEvent) -> Result<(), EmitterError>;
}

/// Default emitter: turns every [`TracedEvent`] into a structured
/// `tracing` call at an appropriate level.
#[derive(Debug, Default, Clone)]
pub struct TracingEventEmitter;

impl EventEmitter for TracingEventEmitter {
    fn emit(&self, event: TracedEvent) -> Result<(), EmitterError> {
        let key = event.event.key();
        match &event.event {
            EngineEvent::GapIdentified { gap_type, severity } => {
                tracing::warn!(
                    trace_id = %event.trace_id,
                    session_id = %event.session_id,
                    story_id = ?event.story_id,
                    key,
                    gap_type,
                    severity,
                    "gap identified"
                );
            }
            EngineEvent::GraphNodeStarted { node, step } => {
                tracing::debug!(
                    trace_id = %event.trace_id,
                    session_id = %event.session_id,
                    key,
                    node,
                    step,
                    "node started"
                );
            }
            EngineEvent::GraphNodeCompleted { node, step, duration_ms } => {
                tracing::info!(
                    trace_id = %event.trace_id,
                    session_id = %event.session_id,
                    key,
                    node,
                    step,
                    duration_ms,
                    "node completed"
                );
            }
            other => {
                tracing::info!(
                    trace_id = %event.trace_id,
                    session_id = %event.session_id,
                    story_id = ?event.story_id,
                    key,
                    event = ?other,
                    "engine event"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_keys_match_taxonomy() {
        assert_eq!(EngineEvent::StoryStarted.key(), "story.started");
        assert_eq!(
            EngineEvent::CharacterArcUpdated {
                player_id: "p1".into(),
                arc_position: 0.5
            }
            .key(),
            "character.arc_updated"
        );
    }

    #[test]
    fn tracing_emitter_never_fails() {
        let emitter = TracingEventEmitter;
        let result = emitter.emit(TracedEvent {
            trace_id: "t1".into(),
            session_id: "s1".into(),
            story_id: None,
            event: EngineEvent::StoryStarted,
        });
        assert!(result.is_ok());
    }
}
