//! [`Gap`]: a quantified quality deficiency (spec §3, §4.3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Dimension, GapType, Severity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub gap_id: Uuid,
    pub gap_type: GapType,
    pub dimension: Dimension,

    pub score: f64,
    pub severity: Severity,
    pub confidence: f64,

    pub description: String,
    pub evidence: Vec<String>,
    pub suggested_flows: Vec<String>,

    pub beat_id: Uuid,
}

impl Gap {
    /// Build a gap from a deficient dimension score, deriving `severity`
    /// from `score` and `suggested_flows` from the gap type's default
    /// route (spec §4.3).
    #[must_use]
    pub fn new(
        gap_type: GapType,
        score: f64,
        confidence: f64,
        description: impl Into<String>,
        evidence: Vec<String>,
        beat_id: Uuid,
    ) -> Self {
        let (flow_id, _priority) = gap_type.default_flow();
        Self {
            gap_id: Uuid::new_v4(),
            gap_type,
            dimension: gap_type.dimension(),
            score,
            severity: Severity::from_score(score),
            confidence,
            description: description.into(),
            evidence,
            suggested_flows: vec![flow_id.to_string()],
            beat_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_gap_derives_severity_and_dimension() {
        let gap = Gap::new(
            GapType::ThemeMissing,
            0.2,
            0.8,
            "theme absent from passage",
            vec!["no keyword matches".to_string()],
            Uuid::new_v4(),
        );
        assert_eq!(gap.dimension, Dimension::Thematic);
        assert_eq!(gap.severity, Severity::Critical);
        assert_eq!(gap.suggested_flows, vec!["thematic_weaving".to_string()]);
    }
}
