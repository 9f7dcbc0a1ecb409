//! [`NCPState`]: the narrative context that flows between graph nodes (spec §3).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{CharacterArcState, Gap, StoryBeat};
use crate::types::DramaticPhase;

/// The running semantic state threaded through generation — Narrative
/// Context Persistence. Created at graph entry, mutated exclusively by
/// graph nodes during a single run, and produced as the final output
/// alongside the beat list (spec §3 "Lifecycle").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NCPState {
    pub beats: Vec<StoryBeat>,
    pub current_beat_index: u32,

    pub active_perspective: Option<String>,
    pub active_theme: Option<String>,
    pub dramatic_phase: DramaticPhase,
    pub act_number: u32,
    pub tension_level: f64,

    pub character_states: FxHashMap<String, CharacterArcState>,

    pub identified_gaps: Vec<Gap>,
    pub enrichment_count: u32,

    /// Opaque result of an external Three-Universe analysis, when supplied.
    /// The core never interprets it beyond exposing `coherence_score`.
    pub three_universe_analysis: Option<serde_json::Value>,
    pub coherence_score: Option<f64>,
}

impl NCPState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tension_level: 0.0,
            act_number: 1,
            ..Default::default()
        }
    }

    /// Append a freshly generated beat, advancing `current_beat_index`
    /// (spec §4.1 "State update on success", spec §8 invariant
    /// `len(beats) == current_beat_index`).
    pub fn append_beat(&mut self, beat: StoryBeat) {
        self.beats.push(beat);
        self.current_beat_index = self.beats.len() as u32;
    }

    /// Replace the most recently appended beat in place, preserving
    /// ordering by `beat_index` (spec §5 "Ordering": "an enriched beat
    /// replaces its predecessor at the same index").
    pub fn replace_last_beat(&mut self, beat: StoryBeat) {
        if let Some(slot) = self.beats.last_mut() {
            *slot = beat;
        } else {
            self.append_beat(beat);
        }
    }

    #[must_use]
    pub fn last_beat(&self) -> Option<&StoryBeat> {
        self.beats.last()
    }

    /// `true` iff `beats.len() == current_beat_index` (spec §8 invariant).
    #[must_use]
    pub fn is_internally_consistent(&self) -> bool {
        self.beats.len() as u32 == self.current_beat_index
    }
}
