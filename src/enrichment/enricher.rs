//! Iterative emotional quality enrichment (spec §4.2).

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::enrichment::classifier::parse_classifier_response;
use crate::enrichment::techniques::collect_instructions;
use crate::llm::{LlmAdapter, LlmError};
use crate::model::{EmotionalAnalysis, StoryBeat};

#[derive(Debug, Error, Diagnostic)]
pub enum EnricherError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),
}

/// The outcome of running [`EmotionalBeatEnricher::analyze_and_enrich`]
/// (spec §4.2 "Public operation", field set verbatim).
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedBeatResult {
    pub original: StoryBeat,
    pub r#final: StoryBeat,
    pub initial_analysis: EmotionalAnalysis,
    pub final_analysis: EmotionalAnalysis,
    pub iterations: u32,
    pub was_enriched: bool,
    pub improvement_delta: f64,
    pub notes: Vec<String>,
}

const MAX_TECHNIQUE_INSTRUCTIONS: usize = 6;

/// Brings a beat's emotional quality up to a configured threshold.
pub struct EmotionalBeatEnricher {
    llm: Arc<dyn LlmAdapter>,
}

impl EmotionalBeatEnricher {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmAdapter>) -> Self {
        Self { llm }
    }

    /// Classify a beat via one LLM call (spec §4.2 step 1).
    pub async fn classify(&self, beat: &StoryBeat) -> Result<EmotionalAnalysis, EnricherError> {
        let prompt = format!(
            "Classify the emotional quality of this passage. Respond with KEY: value \
             lines for PRIMARY_EMOTION, SECONDARY_EMOTIONS, CONFIDENCE_SCORE, \
             RESONANCE_SCORE, SPECIFICITY_SCORE, AUTHENTICITY_SCORE, IMPROVEMENT_AREAS, \
             SUGGESTED_TECHNIQUES.\n\n{}",
            beat.raw_text
        );
        let response = self.llm.generate(&prompt).await?;
        Ok(parse_classifier_response(&response))
    }

    fn build_enrichment_prompt(
        &self,
        beat: &StoryBeat,
        analysis: &EmotionalAnalysis,
        length_tolerance: f64,
    ) -> String {
        let instructions = collect_instructions(&analysis.improvement_areas, MAX_TECHNIQUE_INSTRUCTIONS);
        let lower = 1.0 - length_tolerance;
        let upper = 1.0 + length_tolerance;
        format!(
            "Rewrite this passage to strengthen its emotional quality. Keep the same \
             character and events; stay within {:.0}%-{:.0}% of the original length.\n\n\
             ORIGINAL:\n{}\n\nCLASSIFIER FINDINGS:\nprimary emotion: {}\nconfidence: {:.2}\n\
             resonance: {:.2}\nspecificity: {:.2}\nauthenticity: {:.2}\n\nAPPLY THESE TECHNIQUES:\n{}",
            lower * 100.0,
            upper * 100.0,
            beat.raw_text,
            analysis.primary_emotion,
            analysis.confidence,
            analysis.resonance,
            analysis.specificity,
            analysis.authenticity,
            instructions.join("\n"),
        )
    }

    /// Rejects an enrichment that changed `character_id` or whose length
    /// ratio to the original falls outside `[1 - tolerance, 1 + tolerance]`
    /// (spec §4.2 "Validation", default tolerance 0.20).
    fn passes_validation(original: &StoryBeat, candidate: &StoryBeat, length_tolerance: f64) -> bool {
        if candidate.character_id != original.character_id {
            return false;
        }
        let ratio = original.length_ratio_to(candidate);
        let lower = 1.0 - length_tolerance;
        let upper = 1.0 + length_tolerance;
        ratio >= lower && ratio <= upper
    }

    /// Run the refine-reanalyze loop described in spec §4.2.
    pub async fn analyze_and_enrich(
        &self,
        beat: &StoryBeat,
        threshold: f64,
        max_iterations: u32,
        min_improvement: f64,
        length_tolerance: f64,
    ) -> Result<EnrichedBeatResult, EnricherError> {
        let original = beat.clone();
        let initial_analysis = self.classify(&original).await?;

        if initial_analysis.quality_score() >= threshold {
            return Ok(EnrichedBeatResult {
                original: original.clone(),
                r#final: original,
                final_analysis: initial_analysis.clone(),
                initial_analysis,
                iterations: 0,
                was_enriched: false,
                improvement_delta: 0.0,
                notes: vec!["quality already at or above threshold".to_string()],
            });
        }

        let mut best_beat = original.clone();
        let mut best_analysis = initial_analysis.clone();
        let mut notes = Vec::new();
        let mut iterations = 0u32;
        let mut was_enriched = false;

        let mut current_analysis = initial_analysis.clone();

        while iterations < max_iterations {
            iterations += 1;

            let prompt = self.build_enrichment_prompt(&best_beat, &current_analysis, length_tolerance);
            let response = self.llm.generate(&prompt).await?;

            let mut candidate = best_beat.with_rewritten_text(response);
            for area in &current_analysis.improvement_areas {
                candidate.enrichments_applied.push(area.to_string());
            }

            if !Self::passes_validation(&original, &candidate, length_tolerance) {
                notes.push(format!("iteration {iterations}: rejected by post-hoc validation"));
                break;
            }

            let candidate_analysis = self.classify(&candidate).await?;
            let delta = candidate_analysis.quality_score() - best_analysis.quality_score();

            if candidate_analysis.quality_score() > best_analysis.quality_score() {
                best_beat = candidate;
                was_enriched = true;
                best_analysis = candidate_analysis.clone();
                current_analysis = candidate_analysis;
            } else {
                notes.push(format!("iteration {iterations}: rewrite scored no better, keeping prior best"));
                current_analysis = best_analysis.clone();
            }

            if delta < min_improvement {
                notes.push(format!("iteration {iterations}: improvement below minimum, stopping"));
                break;
            }
            if best_analysis.quality_score() >= threshold {
                notes.push(format!("iteration {iterations}: reached threshold"));
                break;
            }
        }

        let improvement_delta = best_analysis.quality_score() - initial_analysis.quality_score();

        Ok(EnrichedBeatResult {
            original,
            r#final: best_beat,
            initial_analysis,
            final_analysis: best_analysis,
            iterations,
            was_enriched,
            improvement_delta,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SyncLlmAdapter;
    use std::sync::Mutex;

    fn scripted_adapter(responses: Vec<&'static str>) -> Arc<dyn LlmAdapter> {
        let responses = Arc::new(Mutex::new(responses.into_iter()));
        Arc::new(SyncLlmAdapter::new("scripted", move |_: &str| {
            let mut iter = responses.lock().unwrap();
            Ok(iter.next().unwrap_or("").to_string())
        }))
    }

    #[tokio::test]
    async fn threshold_already_met_short_circuits() {
        let llm = scripted_adapter(vec![
            "PRIMARY_EMOTION: hope\nCONFIDENCE: 0.9\nRESONANCE: 0.9\nSPECIFICITY: 0.9\nAUTHENTICITY: 0.9",
        ]);
        let enricher = EmotionalBeatEnricher::new(llm);
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "a passage of reasonable length".to_string();

        let result = enricher.analyze_and_enrich(&beat, 0.75, 3, 0.05, 0.20).await.unwrap();
        assert!(!result.was_enriched);
        assert_eq!(result.iterations, 0);
        assert!((result.initial_analysis.quality_score() - 0.90).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enrichment_converges_and_records_delta() {
        let llm = scripted_adapter(vec![
            "PRIMARY_EMOTION: flat\nCONFIDENCE: 0.5\nRESONANCE: 0.5\nSPECIFICITY: 0.5\nAUTHENTICITY: 0.5\nIMPROVEMENT_AREAS: stakes",
            "She pressed her palm flat against the wall.",
            "PRIMARY_EMOTION: hope\nCONFIDENCE: 0.8\nRESONANCE: 0.8\nSPECIFICITY: 0.8\nAUTHENTICITY: 0.8",
        ]);
        let enricher = EmotionalBeatEnricher::new(llm);
        let mut beat = StoryBeat::new(0, "p1", "Mira");
        beat.raw_text = "She pressed her palm flat against the door.".to_string();

        let result = enricher.analyze_and_enrich(&beat, 0.75, 3, 0.05, 0.20).await.unwrap();
        assert!(result.was_enriched);
        assert_eq!(result.iterations, 1);
        assert!(result.improvement_delta > 0.0);
    }
}
