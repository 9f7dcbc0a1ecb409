//! [`StoryBeat`]: the fundamental unit of narrative output (spec §3).

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One generated narrative passage.
///
/// `beat_id` is assigned once at construction and never mutates; the only
/// fields meant to be rewritten in place after construction are
/// `quality_score` (by the analytical loop, monotonically on genuine
/// improvement) and `enrichments_applied` (appended to by enrichment flows).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryBeat {
    pub beat_id: Uuid,
    pub beat_index: u32,

    pub raw_text: String,
    pub dialogue: Option<String>,
    pub action: Option<String>,
    pub internal: Option<String>,

    pub character_id: String,
    pub character_name: String,
    pub emotional_tone: Option<String>,
    pub theme_resonance: Option<String>,

    pub quality_score: f64,
    pub enrichments_applied: Vec<String>,

    pub timestamp: DateTime<Utc>,
    pub ncp_metadata: FxHashMap<String, Value>,
}

impl StoryBeat {
    /// Construct a fresh beat with `beat_index` assigned by the caller
    /// (normally [`crate::model::NCPState::current_beat_index`]).
    #[must_use]
    pub fn new(beat_index: u32, character_id: impl Into<String>, character_name: impl Into<String>) -> Self {
        Self {
            beat_id: Uuid::new_v4(),
            beat_index,
            raw_text: String::new(),
            dialogue: None,
            action: None,
            internal: None,
            character_id: character_id.into(),
            character_name: character_name.into(),
            emotional_tone: None,
            theme_resonance: None,
            quality_score: 0.0,
            enrichments_applied: Vec::new(),
            timestamp: Utc::now(),
            ncp_metadata: FxHashMap::default(),
        }
    }

    /// Produce a variant of this beat with new text and tone, preserving
    /// identity (`beat_id`, `beat_index`, `character_id`) and metadata, as
    /// required when the enricher or a remediation flow replaces a beat in
    /// place (spec §4.2 step 3, §4.3 "Remediation pipeline").
    #[must_use]
    pub fn with_rewritten_text(&self, raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            dialogue: None,
            action: None,
            internal: None,
            emotional_tone: self.emotional_tone.clone(),
            theme_resonance: self.theme_resonance.clone(),
            quality_score: self.quality_score,
            enrichments_applied: self.enrichments_applied.clone(),
            timestamp: Utc::now(),
            ..self.clone()
        }
    }

    /// `true` once at least one structured field parsed out of the wire XML.
    #[must_use]
    pub fn has_structured_fields(&self) -> bool {
        self.dialogue.is_some() || self.action.is_some() || self.internal.is_some()
    }

    /// Length ratio of `other` relative to `self`, used by the enricher's
    /// post-hoc validation (spec §4.2, "Validation").
    #[must_use]
    pub fn length_ratio_to(&self, other: &StoryBeat) -> f64 {
        let base = self.raw_text.chars().count().max(1) as f64;
        let candidate = other.raw_text.chars().count() as f64;
        candidate / base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewritten_text_preserves_identity() {
        let beat = StoryBeat::new(0, "char-1", "Mira");
        let rewritten = beat.with_rewritten_text("A new passage.");
        assert_eq!(rewritten.beat_id, beat.beat_id);
        assert_eq!(rewritten.beat_index, beat.beat_index);
        assert_eq!(rewritten.character_id, beat.character_id);
        assert_eq!(rewritten.raw_text, "A new passage.");
    }

    #[test]
    fn length_ratio_is_relative_to_self() {
        let mut beat = StoryBeat::new(0, "char-1", "Mira");
        beat.raw_text = "0123456789".to_string();
        let mut longer = beat.clone();
        longer.raw_text = "01234567890123456789".to_string();
        assert!((beat.length_ratio_to(&longer) - 2.0).abs() < 1e-9);
    }
}
