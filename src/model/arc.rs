//! [`ArcPoint`], [`CharacterArcState`], and [`RelationshipState`] — the
//! per-character developmental history (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ArcDirection, CharacterRole};

/// A single developmental event for one character at one beat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcPoint {
    pub beat_id: Uuid,
    pub beat_index: u32,
    pub timestamp: DateTime<Utc>,
    pub emotional_state: String,
    pub arc_direction: ArcDirection,
    pub impact_magnitude: f64,
}

impl ArcPoint {
    #[must_use]
    pub fn new(
        beat_id: Uuid,
        beat_index: u32,
        emotional_state: impl Into<String>,
        arc_direction: ArcDirection,
        impact_magnitude: f64,
    ) -> Self {
        Self {
            beat_id,
            beat_index,
            timestamp: Utc::now(),
            emotional_state: emotional_state.into(),
            arc_direction,
            impact_magnitude: impact_magnitude.clamp(0.0, 1.0),
        }
    }

    /// Formatted as `[direction] emotion (impact: X.XX)`, matching the
    /// string `CharacterArcTracker::get_arc_context` embeds per point
    /// (spec §4.4).
    #[must_use]
    pub fn format_line(&self) -> String {
        format!(
            "[{}] {} (impact: {:.2})",
            self.arc_direction, self.emotional_state, self.impact_magnitude
        )
    }
}

/// The relationship one character holds with another. Only one side of a
/// pair owns the authoritative edge; the reverse view is derived on read
/// (spec §9, Design Notes on the cyclic relationship graph).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipState {
    pub relationship_type: String,
    pub trust_level: f64,
    pub history: Vec<String>,
    pub current_dynamic: String,
}

impl RelationshipState {
    #[must_use]
    pub fn new(relationship_type: impl Into<String>) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            trust_level: 0.0,
            history: Vec::new(),
            current_dynamic: String::new(),
        }
    }

    /// Record an event and nudge trust, clamped to `[-1, 1]`.
    pub fn record_event(&mut self, event: impl Into<String>, trust_delta: f64) {
        self.history.push(event.into());
        self.trust_level = (self.trust_level + trust_delta).clamp(-1.0, 1.0);
    }
}

/// Comprehensive per-character journey across a session (spec §3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterArcState {
    pub player_id: String,
    pub name: String,

    pub wound: Option<String>,
    pub desire: Option<String>,
    pub arc_description: Option<String>,
    pub role: CharacterRole,

    pub current_emotional_state: String,
    pub active_goals: Vec<String>,
    pub active_fears: Vec<String>,

    pub arc_points: Vec<ArcPoint>,
    pub arc_position: f64,

    pub relationship_map: rustc_hash::FxHashMap<String, RelationshipState>,
}

impl CharacterArcState {
    #[must_use]
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            wound: None,
            desire: None,
            arc_description: None,
            role: CharacterRole::Supporting,
            current_emotional_state: String::new(),
            active_goals: Vec::new(),
            active_fears: Vec::new(),
            arc_points: Vec::new(),
            arc_position: 0.0,
            relationship_map: rustc_hash::FxHashMap::default(),
        }
    }

    /// Append an arc point and fold its signed impact into `arc_position`,
    /// clamped to `[0, 1]` (spec §3 invariant: `±0.1 * impact_magnitude`).
    pub fn push_arc_point(&mut self, point: ArcPoint) {
        self.current_emotional_state = point.emotional_state.clone();
        let delta = 0.1 * point.arc_direction.sign() * point.impact_magnitude;
        self.arc_position = (self.arc_position + delta).clamp(0.0, 1.0);
        self.arc_points.push(point);
    }

    /// Last `depth` arc points, oldest first, for context truncation
    /// (spec §4.1 "character arc context ... truncated to context_depth").
    #[must_use]
    pub fn recent_arc_points(&self, depth: usize) -> &[ArcPoint] {
        let len = self.arc_points.len();
        let start = len.saturating_sub(depth);
        &self.arc_points[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_position_moves_by_signed_scaled_impact() {
        let mut state = CharacterArcState::new("p1", "Mira");
        state.push_arc_point(ArcPoint::new(
            Uuid::new_v4(),
            0,
            "hope",
            ArcDirection::Ascending,
            0.3,
        ));
        assert!((state.arc_position - 0.03).abs() < 1e-9);
    }

    #[test]
    fn arc_position_stays_within_bounds() {
        let mut state = CharacterArcState::new("p1", "Mira");
        for _ in 0..50 {
            state.push_arc_point(ArcPoint::new(
                Uuid::new_v4(),
                0,
                "triumph",
                ArcDirection::Ascending,
                1.0,
            ));
        }
        assert!(state.arc_position <= 1.0);
        for _ in 0..200 {
            state.push_arc_point(ArcPoint::new(
                Uuid::new_v4(),
                0,
                "despair",
                ArcDirection::Descending,
                1.0,
            ));
        }
        assert!(state.arc_position >= 0.0);
    }

    #[test]
    fn recent_arc_points_truncates_from_the_tail() {
        let mut state = CharacterArcState::new("p1", "Mira");
        for i in 0..5 {
            state.push_arc_point(ArcPoint::new(
                Uuid::new_v4(),
                i,
                "static",
                ArcDirection::Static,
                0.1,
            ));
        }
        let recent = state.recent_arc_points(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent.last().unwrap().beat_index, 4);
    }
}
