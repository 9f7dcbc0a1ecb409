//! Parses the emotional classifier's `KEY: value` response format (spec §6).
//! Accepts both the bare field name (`RESONANCE`) and the `_SCORE`-suffixed
//! form (`RESONANCE_SCORE`) for `confidence`/`resonance`/`specificity`/
//! `authenticity`, since external classifiers that honor the wire contract
//! literally use the suffixed form.

use crate::model::EmotionalAnalysis;
use crate::types::ImprovementArea;

/// Parse a classifier response into an [`EmotionalAnalysis`].
///
/// Lines are matched case-insensitively as `KEY: value`. A numeric field
/// that fails to parse falls back to `0.5` (spec §4.2 step 1: "unparseable
/// values fall back to 0.5"). If not a single recognised key is found the
/// whole response is unparseable and [`EmotionalAnalysis::unclassified`] is
/// returned instead.
#[must_use]
pub fn parse_classifier_response(response: &str) -> EmotionalAnalysis {
    let mut primary_emotion: Option<String> = None;
    let mut secondary_emotions = Vec::new();
    let mut confidence: Option<f64> = None;
    let mut resonance: Option<f64> = None;
    let mut specificity: Option<f64> = None;
    let mut authenticity: Option<f64> = None;
    let mut improvement_areas = Vec::new();
    let mut suggested_techniques = Vec::new();
    let mut any_key_recognized = false;

    for line in response.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "primary_emotion" => {
                any_key_recognized = true;
                primary_emotion = Some(value.to_lowercase());
            }
            "secondary_emotions" => {
                any_key_recognized = true;
                secondary_emotions = split_list(value);
            }
            "confidence" | "confidence_score" => {
                any_key_recognized = true;
                confidence = Some(parse_score_or_fallback(value));
            }
            "resonance" | "resonance_score" => {
                any_key_recognized = true;
                resonance = Some(parse_score_or_fallback(value));
            }
            "specificity" | "specificity_score" => {
                any_key_recognized = true;
                specificity = Some(parse_score_or_fallback(value));
            }
            "authenticity" | "authenticity_score" => {
                any_key_recognized = true;
                authenticity = Some(parse_score_or_fallback(value));
            }
            "improvement_areas" => {
                any_key_recognized = true;
                improvement_areas = split_list(value)
                    .iter()
                    .filter_map(|s| ImprovementArea::parse(s))
                    .collect();
            }
            "suggested_techniques" => {
                any_key_recognized = true;
                suggested_techniques = split_list(value);
            }
            _ => {}
        }
    }

    if !any_key_recognized {
        return EmotionalAnalysis::unclassified();
    }

    EmotionalAnalysis {
        primary_emotion: primary_emotion.unwrap_or_else(|| "unclassified".to_string()),
        secondary_emotions,
        confidence: confidence.unwrap_or(0.5),
        resonance: resonance.unwrap_or(0.5),
        specificity: specificity.unwrap_or(0.5),
        authenticity: authenticity.unwrap_or(0.5),
        improvement_areas,
        suggested_techniques,
    }
}

fn parse_score_or_fallback(value: &str) -> f64 {
    value.parse::<f64>().map(|v| v.clamp(0.0, 1.0)).unwrap_or(0.5)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_response() {
        let response = "PRIMARY_EMOTION: hope\nCONFIDENCE: 0.8\nRESONANCE: 0.7\n\
                         SPECIFICITY: 0.6\nAUTHENTICITY: 0.75\nIMPROVEMENT_AREAS: stakes, dialogue";
        let analysis = parse_classifier_response(response);
        assert_eq!(analysis.primary_emotion, "hope");
        assert_eq!(analysis.confidence, 0.8);
        assert_eq!(analysis.improvement_areas, vec![ImprovementArea::Stakes, ImprovementArea::Dialogue]);
    }

    #[test]
    fn parses_score_suffixed_keys() {
        let response = "PRIMARY_EMOTION: hope\nCONFIDENCE_SCORE: 0.8\nRESONANCE_SCORE: 0.7\n\
                         SPECIFICITY_SCORE: 0.6\nAUTHENTICITY_SCORE: 0.75";
        let analysis = parse_classifier_response(response);
        assert_eq!(analysis.confidence, 0.8);
        assert_eq!(analysis.resonance, 0.7);
        assert_eq!(analysis.specificity, 0.6);
        assert_eq!(analysis.authenticity, 0.75);
    }

    #[test]
    fn unparseable_numeric_field_falls_back_to_half() {
        let response = "PRIMARY_EMOTION: hope\nCONFIDENCE: not-a-number";
        let analysis = parse_classifier_response(response);
        assert_eq!(analysis.confidence, 0.5);
    }

    #[test]
    fn wholly_unparseable_response_is_unclassified() {
        let analysis = parse_classifier_response("the model just rambled with no structure");
        assert_eq!(analysis.primary_emotion, "unclassified");
        assert_eq!(analysis.confidence, 0.0);
    }
}
