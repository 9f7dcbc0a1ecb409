//! [`EmotionalAnalysis`]: the classifier's report on one beat (spec §3).

use serde::{Deserialize, Serialize};

use crate::types::ImprovementArea;

/// The classifier's report on a single [`crate::model::StoryBeat`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionalAnalysis {
    pub primary_emotion: String,
    pub secondary_emotions: Vec<String>,
    pub confidence: f64,

    pub resonance: f64,
    pub specificity: f64,
    pub authenticity: f64,

    pub improvement_areas: Vec<ImprovementArea>,
    pub suggested_techniques: Vec<String>,
}

impl EmotionalAnalysis {
    /// `0.20*confidence + 0.35*resonance + 0.25*specificity + 0.20*authenticity`
    /// (spec §3, exact weights; spec §8 requires this within 1e-9).
    #[must_use]
    pub fn quality_score(&self) -> f64 {
        0.20 * self.confidence + 0.35 * self.resonance + 0.25 * self.specificity + 0.20 * self.authenticity
    }

    /// The fallback analysis used when the classifier response is entirely
    /// unparseable (spec §4.2 step 1: "unparseable response yields
    /// primary_emotion='unclassified', confidence=0").
    #[must_use]
    pub fn unclassified() -> Self {
        Self {
            primary_emotion: "unclassified".to_string(),
            secondary_emotions: Vec::new(),
            confidence: 0.0,
            resonance: 0.0,
            specificity: 0.0,
            authenticity: 0.0,
            improvement_areas: Vec::new(),
            suggested_techniques: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_score_matches_exact_weights() {
        let analysis = EmotionalAnalysis {
            primary_emotion: "hope".to_string(),
            secondary_emotions: vec![],
            confidence: 0.9,
            resonance: 0.9,
            specificity: 0.9,
            authenticity: 0.9,
            improvement_areas: vec![],
            suggested_techniques: vec![],
        };
        assert!((analysis.quality_score() - 0.90).abs() < 1e-9);
    }

    #[test]
    fn unclassified_has_zero_confidence() {
        let analysis = EmotionalAnalysis::unclassified();
        assert_eq!(analysis.primary_emotion, "unclassified");
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.quality_score(), 0.0);
    }
}
