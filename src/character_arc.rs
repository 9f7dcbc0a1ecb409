//! Character-Arc Tracker (spec §4.4).
//!
//! Maintains and exposes [`CharacterArcState`] per character across beats.
//! Unknown character ids are a no-op returning `None` everywhere — the
//! tracker never raises (spec §7).

use rustc_hash::FxHashMap;

use crate::model::{ArcPoint, CharacterArcState, RelationshipState, StoryBeat};
use crate::types::{ArcDirection, CharacterRole};

/// Pluggable consistency check used by [`CharacterArcTracker::validate_consistency`].
///
/// Real consistency checking (contradictory traits, voice drift, broken
/// promises) is left as a pluggable hook rather than guessed at;
/// [`DefaultConsistencyEvaluator`] always reports full consistency, and
/// callers needing a real check can supply their own evaluator.
pub trait ConsistencyEvaluator: Send + Sync {
    fn evaluate(&self, beat: &StoryBeat, character: &CharacterArcState) -> ConsistencyReport;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsistencyReport {
    pub is_consistent: bool,
    pub score: f64,
    pub issues: Vec<String>,
}

/// The source's always-passing default (spec §4.4, §9).
#[derive(Default)]
pub struct DefaultConsistencyEvaluator;

impl ConsistencyEvaluator for DefaultConsistencyEvaluator {
    fn evaluate(&self, _beat: &StoryBeat, _character: &CharacterArcState) -> ConsistencyReport {
        ConsistencyReport {
            is_consistent: true,
            score: 1.0,
            issues: Vec::new(),
        }
    }
}

/// Default moderate impact used when a beat does not otherwise specify one
/// (spec §4.4 "record_beat_impact ... default moderate impact 0.3").
pub const DEFAULT_IMPACT_MAGNITUDE: f64 = 0.3;

/// Maintains per-character arc state across a session.
pub struct CharacterArcTracker {
    characters: FxHashMap<String, CharacterArcState>,
    evaluator: Box<dyn ConsistencyEvaluator>,
}

impl Default for CharacterArcTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterArcTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            characters: FxHashMap::default(),
            evaluator: Box::new(DefaultConsistencyEvaluator),
        }
    }

    /// Swap in a custom consistency evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Box<dyn ConsistencyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Idempotent create: returns the existing state unchanged if the
    /// character is already known (spec §4.4 "initialize_character ...
    /// idempotent create").
    pub fn initialize_character(
        &mut self,
        player_id: impl Into<String>,
        name: impl Into<String>,
        wound: Option<String>,
        desire: Option<String>,
        arc_description: Option<String>,
        role: CharacterRole,
    ) -> &CharacterArcState {
        let player_id = player_id.into();
        self.characters.entry(player_id.clone()).or_insert_with(|| {
            let mut state = CharacterArcState::new(player_id.clone(), name.into());
            state.wound = wound;
            state.desire = desire;
            state.arc_description = arc_description;
            state.role = role;
            state
        });
        self.characters.get(&player_id).expect("just inserted")
    }

    #[must_use]
    pub fn get(&self, player_id: &str) -> Option<&CharacterArcState> {
        self.characters.get(player_id)
    }

    /// Append an [`ArcPoint`] derived from `beat` to `player_id`'s history.
    /// Returns `None` if the character is unknown (spec §7: "no-op
    /// returning null").
    pub fn record_beat_impact(&mut self, beat: &StoryBeat, player_id: &str) -> Option<ArcPoint> {
        let state = self.characters.get_mut(player_id)?;
        let tone = beat.emotional_tone.as_deref().unwrap_or("static");
        let direction = ArcDirection::from_emotional_tone(tone);
        let point = ArcPoint::new(
            beat.beat_id,
            beat.beat_index,
            tone,
            direction,
            DEFAULT_IMPACT_MAGNITUDE,
        );
        state.push_arc_point(point.clone());
        Some(point)
    }

    /// A deterministic string context block for prompt assembly (spec
    /// §4.1 "character arc context", §4.4).
    #[must_use]
    pub fn get_arc_context(&self, player_id: &str, depth: usize) -> Option<String> {
        let state = self.characters.get(player_id)?;
        let mut lines = Vec::new();
        lines.push(format!("Character: {}", state.name));
        if let Some(wound) = &state.wound {
            lines.push(format!("Wound: {wound}"));
        }
        if let Some(desire) = &state.desire {
            lines.push(format!("Desire: {desire}"));
        }
        lines.push(format!("Current emotional state: {}", state.current_emotional_state));
        lines.push(format!("Arc position: {:.0}%", state.arc_position * 100.0));
        if !state.active_goals.is_empty() {
            lines.push(format!("Active goals: {}", state.active_goals.join(", ")));
        }
        if !state.active_fears.is_empty() {
            lines.push(format!("Active fears: {}", state.active_fears.join(", ")));
        }
        for point in state.recent_arc_points(depth) {
            lines.push(point.format_line());
        }
        Some(lines.join("\n"))
    }

    /// Check a beat for arc/consistency issues via the pluggable evaluator.
    /// `None` if the character is unknown.
    #[must_use]
    pub fn validate_consistency(&self, beat: &StoryBeat, player_id: &str) -> Option<ConsistencyReport> {
        let state = self.characters.get(player_id)?;
        Some(self.evaluator.evaluate(beat, state))
    }

    /// Look up the relationship `from` holds toward `to`. Falls back to the
    /// reverse edge when `from` has no entry for `to`, so relationship data
    /// is written once from whichever side initiates it, per spec §9's
    /// "derive the reverse view on read" guidance.
    #[must_use]
    pub fn relationship_between(&self, from: &str, to: &str) -> Option<&RelationshipState> {
        let forward = self.characters.get(from)?.relationship_map.get(to);
        if forward.is_some() {
            return forward;
        }
        self.characters.get(to)?.relationship_map.get(from)
    }

    /// Record or update the relationship `from` holds toward `to`. The edge
    /// is always written on `from`'s side, making `from` authoritative for
    /// it going forward.
    pub fn set_relationship(&mut self, from: &str, to: &str, relationship: RelationshipState) -> bool {
        match self.characters.get_mut(from) {
            Some(state) => {
                state.relationship_map.insert(to.to_string(), relationship);
                true
            }
            None => false,
        }
    }
}
