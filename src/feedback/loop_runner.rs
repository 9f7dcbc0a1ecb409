//! The Analytical Feedback Loop itself (spec §4.3).

use miette::Diagnostic;
use thiserror::Error;

use crate::character_arc::CharacterArcTracker;
use crate::feedback::flows::FlowRegistry;
use crate::feedback::scoring::{score_all, DimensionScores};
use crate::model::{EmotionalAnalysis, Gap, StoryBeat};
use crate::types::{ArcDirection, Dimension, GapType};

#[derive(Debug, Error, Diagnostic)]
pub enum FeedbackLoopError {}

/// Result of running one beat through the feedback loop (spec §4.3's
/// `process_beat_with_analysis`).
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedBeat {
    pub beat: StoryBeat,
    pub scores: DimensionScores,
    pub overall_quality: f64,
    pub gaps: Vec<Gap>,
    pub remediation_notes: Vec<String>,
}

/// Performs multi-dimensional analysis, derives prioritized gaps, and
/// routes each gap to a remediation flow.
pub struct AnalyticalFeedbackLoop {
    registry: FlowRegistry,
}

impl Default for AnalyticalFeedbackLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticalFeedbackLoop {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: FlowRegistry::new_default_registry(),
        }
    }

    #[must_use]
    pub fn with_registry(registry: FlowRegistry) -> Self {
        Self { registry }
    }

    pub fn register_flow(&mut self, route: crate::feedback::flows::FlowRoute) {
        self.registry.register_flow(route);
    }

    /// Select the gap type for a deficient dimension, given the scores
    /// already computed for this beat (spec §4.3 gap taxonomy).
    fn gap_type_for_dimension(dimension: Dimension, scores: &DimensionScores) -> GapType {
        match dimension {
            Dimension::Emotional => GapType::EmotionalWeak,
            Dimension::Character => match scores.character_arc_direction {
                Some(ArcDirection::Static) => GapType::CharacterStatic,
                _ => GapType::CharacterInconsistent,
            },
            Dimension::Thematic => GapType::ThemeMissing,
            Dimension::Structural => GapType::DialogueWeak,
        }
    }

    /// Emit one [`Gap`] per dimension whose primary score is below
    /// `gap_threshold`, capped at `max_gaps_per_beat` and sorted ascending
    /// by score (worst first), per spec §4.3 "Gap identification".
    #[must_use]
    pub fn identify_gaps(
        &self,
        beat: &StoryBeat,
        scores: &DimensionScores,
        gap_threshold: f64,
        max_gaps_per_beat: usize,
    ) -> Vec<Gap> {
        let mut candidates: Vec<(f64, Dimension)> = vec![
            (scores.emotional, Dimension::Emotional),
            (scores.character, Dimension::Character),
            (scores.thematic_presence, Dimension::Thematic),
            (scores.structural, Dimension::Structural),
        ]
        .into_iter()
        .filter(|(score, _)| *score < gap_threshold)
        .collect();

        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(max_gaps_per_beat);

        candidates
            .into_iter()
            .map(|(score, dimension)| {
                let gap_type = Self::gap_type_for_dimension(dimension, scores);
                Gap::new(
                    gap_type,
                    score,
                    1.0 - score,
                    format!("{dimension} score {score:.2} below threshold {gap_threshold:.2}"),
                    vec![format!("dimension={dimension}")],
                    beat.beat_id,
                )
            })
            .collect()
    }

    /// Run scoring, gap identification, and (if `auto_remediate`)
    /// remediation for one beat, returning the possibly-replaced beat
    /// alongside its analysis (spec §4.3, §4.5 `analyze_beat`).
    pub async fn process_beat_with_analysis(
        &self,
        beat: &StoryBeat,
        emotional_analysis: &EmotionalAnalysis,
        tracker: &CharacterArcTracker,
        player_id: &str,
        theme: Option<&str>,
        gap_threshold: f64,
        max_gaps_per_beat: usize,
        auto_remediate: bool,
    ) -> Result<ProcessedBeat, FeedbackLoopError> {
        let scores = score_all(beat, emotional_analysis, tracker, player_id, theme);
        let overall_quality = scores.overall_quality();
        let gaps = self.identify_gaps(beat, &scores, gap_threshold, max_gaps_per_beat);

        let mut current = beat.clone();
        let mut remediation_notes = Vec::new();

        if auto_remediate {
            for gap in &gaps {
                let Some(route) = self.registry.route_for(gap.gap_type) else {
                    remediation_notes.push(format!("no route for gap type {}", gap.gap_type));
                    continue;
                };
                let enrichment = (route.handler)(&current, gap).await;
                if enrichment.applied {
                    if let Some(content) = enrichment.content {
                        current = current.with_rewritten_text(content);
                    }
                    current.enrichments_applied.push(route.flow_id.clone());
                    current.quality_score =
                        (current.quality_score + enrichment.improvement_score).clamp(0.0, 1.0);
                    remediation_notes.push(format!("applied {}", route.flow_id));
                } else {
                    remediation_notes.push(format!("{} declined to enrich", route.flow_id));
                }
            }
        }

        Ok(ProcessedBeat {
            beat: current,
            scores,
            overall_quality,
            gaps,
            remediation_notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::flows::{Enrichment, FlowRoute};
    use std::sync::Arc;

    fn analysis(score: f64) -> EmotionalAnalysis {
        EmotionalAnalysis {
            primary_emotion: "test".to_string(),
            secondary_emotions: vec![],
            confidence: score,
            resonance: score,
            specificity: score,
            authenticity: score,
            improvement_areas: vec![],
            suggested_techniques: vec![],
        }
    }

    #[tokio::test]
    async fn low_quality_beat_yields_gaps_sorted_worst_first() {
        let loop_runner = AnalyticalFeedbackLoop::new();
        let tracker = CharacterArcTracker::new();
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "plain text".to_string();

        let processed = loop_runner
            .process_beat_with_analysis(&beat, &analysis(0.1), &tracker, "p1", Some("loss"), 0.6, 3, false)
            .await
            .unwrap();

        assert!(!processed.gaps.is_empty());
        for window in processed.gaps.windows(2) {
            assert!(window[0].score <= window[1].score);
        }
    }

    #[tokio::test]
    async fn gap_quality_clamped_at_one() {
        let mut registry = FlowRegistry::new_default_registry();
        registry.register_flow(FlowRoute::new(
            "emotional_enrichment",
            vec![GapType::EmotionalWeak],
            1,
            Arc::new(|_beat, _gap| {
                Box::pin(async {
                    Enrichment {
                        applied: true,
                        content: Some("rewritten".to_string()),
                        improvement_score: 0.9,
                    }
                })
            }),
        ));
        let loop_runner = AnalyticalFeedbackLoop::with_registry(registry);
        let tracker = CharacterArcTracker::new();
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "plain text".to_string();
        beat.quality_score = 0.5;

        let processed = loop_runner
            .process_beat_with_analysis(&beat, &analysis(0.1), &tracker, "p1", None, 0.6, 3, true)
            .await
            .unwrap();

        assert!(processed.beat.quality_score <= 1.0);
        assert_eq!(processed.beat.quality_score, 1.0);
    }

    #[tokio::test]
    async fn no_remediation_when_auto_remediate_disabled() {
        let loop_runner = AnalyticalFeedbackLoop::new();
        let tracker = CharacterArcTracker::new();
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "plain text".to_string();

        let processed = loop_runner
            .process_beat_with_analysis(&beat, &analysis(0.1), &tracker, "p1", None, 0.6, 3, false)
            .await
            .unwrap();

        assert_eq!(processed.beat.raw_text, "plain text");
        assert!(processed.remediation_notes.is_empty());
    }
}
