//! Per-dimension scoring (spec §4.3 "Scoring").

use crate::character_arc::CharacterArcTracker;
use crate::model::{EmotionalAnalysis, StoryBeat};
use crate::types::ArcDirection;

/// The four primary dimension scores that feed gap identification and the
/// unweighted overall quality mean (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DimensionScores {
    pub emotional: f64,
    pub character: f64,
    pub thematic_presence: f64,
    pub thematic_coherence: f64,
    pub structural: f64,
    pub character_arc_direction: Option<ArcDirection>,
}

impl DimensionScores {
    /// Unweighted mean of the four primary per-dimension scores (spec §4.3
    /// "Overall quality = unweighted mean of the per-dimension primary
    /// scores present"). Thematic's primary score is `thematic_presence`.
    #[must_use]
    pub fn overall_quality(&self) -> f64 {
        (self.emotional + self.character + self.thematic_presence + self.structural) / 4.0
    }
}

/// Emotional sub-score is delegated to the enricher's classifier output
/// (spec §4.3: "delegated to the enricher's classifier").
#[must_use]
pub fn score_emotional(analysis: &EmotionalAnalysis) -> f64 {
    analysis.quality_score()
}

/// Character sub-score: consistency defaults to 1.0 unless a
/// [`crate::character_arc::ConsistencyEvaluator`] says otherwise;
/// `arc_direction` is read from the character's latest arc point for
/// downstream gap-type selection (spec §4.3).
#[must_use]
pub fn score_character(
    tracker: &CharacterArcTracker,
    beat: &StoryBeat,
    player_id: &str,
) -> (f64, Option<ArcDirection>) {
    let consistency = tracker
        .validate_consistency(beat, player_id)
        .map_or(1.0, |report| report.score);
    let direction = tracker
        .get(player_id)
        .and_then(|state| state.arc_points.last())
        .map(|point| point.arc_direction);
    (consistency, direction)
}

/// Thematic presence is the fraction of theme keywords found in
/// `raw_text.to_lowercase()`, clamped to 1.0. Coherence is 0.7 if
/// `theme_resonance` is set, else `0.5 * presence` (spec §4.3).
#[must_use]
pub fn score_thematic(beat: &StoryBeat, theme: Option<&str>) -> (f64, f64) {
    let Some(theme) = theme.filter(|t| !t.trim().is_empty()) else {
        return (0.0, 0.0);
    };
    let lower_text = beat.raw_text.to_lowercase();
    let keywords: Vec<&str> = theme.split_whitespace().collect();
    let found = keywords
        .iter()
        .filter(|kw| lower_text.contains(&kw.to_lowercase()))
        .count();
    let presence = if keywords.is_empty() {
        0.0
    } else {
        (found as f64 / keywords.len() as f64).min(1.0)
    };
    let coherence = if beat.theme_resonance.is_some() {
        0.7
    } else {
        0.5 * presence
    };
    (presence, coherence)
}

/// Structural sub-score: a beat that carries structured dialogue or action
/// fields reads as better-paced than bare prose (spec §4.3 leaves the exact
/// structural metric open; this is the engine's concrete choice, recorded
/// in the grounding ledger).
#[must_use]
pub fn score_structural(beat: &StoryBeat) -> f64 {
    if beat.dialogue.is_some() || beat.action.is_some() {
        0.8
    } else {
        0.4
    }
}

#[must_use]
pub fn score_all(
    beat: &StoryBeat,
    emotional_analysis: &EmotionalAnalysis,
    tracker: &CharacterArcTracker,
    player_id: &str,
    theme: Option<&str>,
) -> DimensionScores {
    let (character, character_arc_direction) = score_character(tracker, beat, player_id);
    let (thematic_presence, thematic_coherence) = score_thematic(beat, theme);
    DimensionScores {
        emotional: score_emotional(emotional_analysis),
        character,
        thematic_presence,
        thematic_coherence,
        structural: score_structural(beat),
        character_arc_direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thematic_presence_counts_keyword_fraction() {
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "the loss of innocence haunted every step".to_string();
        let (presence, coherence) = score_thematic(&beat, Some("loss of innocence"));
        assert!((presence - (2.0 / 3.0)).abs() < 1e-9);
        assert!((coherence - 0.5 * presence).abs() < 1e-9);
    }

    #[test]
    fn thematic_coherence_prefers_explicit_resonance() {
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "nothing relevant here".to_string();
        beat.theme_resonance = Some("faint echo".to_string());
        let (_, coherence) = score_thematic(&beat, Some("loss"));
        assert_eq!(coherence, 0.7);
    }

    #[test]
    fn overall_quality_is_unweighted_mean() {
        let scores = DimensionScores {
            emotional: 0.8,
            character: 1.0,
            thematic_presence: 0.6,
            thematic_coherence: 0.7,
            structural: 0.8,
            character_arc_direction: None,
        };
        assert!((scores.overall_quality() - 0.8).abs() < 1e-9);
    }
}
