//! Closed-set enumerations shared across the engine.
//!
//! `arc_direction`, `gap_type`, `dimension`, and the other small closed
//! vocabularies used across beats, gaps, and arcs are real Rust enums here,
//! with `Display`, `encode`/`decode` round-trip helpers, and `From<&str>`
//! fallbacks so callers that still hand us a string (e.g. parsed from an LLM
//! response) degrade to a sensible default instead of panicking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node in the graph orchestrator (spec §4.5).
///
/// The five built-in nodes are closed, but [`NodeKind::Custom`] lets callers
/// register additional remediation or housekeeping nodes via
/// `GraphBuilder::add_node`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    NcpLoad,
    GenerateBeat,
    AnalyzeBeat,
    ShouldContinue,
    Output,
    Custom(String),
}

impl NodeKind {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::NcpLoad => "ncp_load".to_string(),
            NodeKind::GenerateBeat => "generate_beat".to_string(),
            NodeKind::AnalyzeBeat => "analyze_beat".to_string(),
            NodeKind::ShouldContinue => "should_continue".to_string(),
            NodeKind::Output => "output".to_string(),
            NodeKind::Custom(s) => format!("custom:{s}"),
        }
    }

    #[must_use]
    pub fn decode(s: &str) -> Self {
        match s {
            "ncp_load" => NodeKind::NcpLoad,
            "generate_beat" => NodeKind::GenerateBeat,
            "analyze_beat" => NodeKind::AnalyzeBeat,
            "should_continue" => NodeKind::ShouldContinue,
            "output" => NodeKind::Output,
            other => match other.strip_prefix("custom:") {
                Some(rest) => NodeKind::Custom(rest.to_string()),
                None => NodeKind::Custom(other.to_string()),
            },
        }
    }

    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::decode(s)
    }
}

/// Developmental trajectory of a character at a single [`crate::model::ArcPoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcDirection {
    Ascending,
    Descending,
    Static,
    Crisis,
    Resolution,
}

impl ArcDirection {
    /// Infer a direction from an emotional tone by disjoint keyword sets
    /// (spec §4.1 "State update on success").
    #[must_use]
    pub fn from_emotional_tone(tone: &str) -> Self {
        let tone = tone.to_lowercase();
        const ASCENDING: &[&str] = &["hope", "joy", "triumph", "love", "confidence"];
        const DESCENDING: &[&str] = &["despair", "fear", "grief", "shame", "defeat"];
        const CRISIS: &[&str] = &["crisis", "confrontation", "turning", "revelation"];

        if ASCENDING.iter().any(|kw| tone.contains(kw)) {
            ArcDirection::Ascending
        } else if DESCENDING.iter().any(|kw| tone.contains(kw)) {
            ArcDirection::Descending
        } else if CRISIS.iter().any(|kw| tone.contains(kw)) {
            ArcDirection::Crisis
        } else {
            ArcDirection::Static
        }
    }

    /// Signed multiplier applied to `impact_magnitude` when folding into
    /// `arc_position` (spec §3, CharacterArcState invariants).
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            ArcDirection::Ascending | ArcDirection::Resolution => 1.0,
            ArcDirection::Descending | ArcDirection::Crisis => -1.0,
            ArcDirection::Static => 0.0,
        }
    }
}

impl fmt::Display for ArcDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArcDirection::Ascending => "ascending",
            ArcDirection::Descending => "descending",
            ArcDirection::Static => "static",
            ArcDirection::Crisis => "crisis",
            ArcDirection::Resolution => "resolution",
        };
        write!(f, "{s}")
    }
}

/// Narrative role a character occupies (spec §3, CharacterArcState).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterRole {
    Protagonist,
    Antagonist,
    Supporting,
    Other(String),
}

impl fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterRole::Protagonist => write!(f, "protagonist"),
            CharacterRole::Antagonist => write!(f, "antagonist"),
            CharacterRole::Supporting => write!(f, "supporting"),
            CharacterRole::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for CharacterRole {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "protagonist" => CharacterRole::Protagonist,
            "antagonist" => CharacterRole::Antagonist,
            "supporting" => CharacterRole::Supporting,
            _ => CharacterRole::Other(s.to_string()),
        }
    }
}

/// Coarse plot position (spec GLOSSARY, "Dramatic phase").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DramaticPhase {
    #[default]
    Setup,
    Confrontation,
    Resolution,
}

impl fmt::Display for DramaticPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DramaticPhase::Setup => "setup",
            DramaticPhase::Confrontation => "confrontation",
            DramaticPhase::Resolution => "resolution",
        };
        write!(f, "{s}")
    }
}

/// Closed taxonomy of quality gaps (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    EmotionalWeak,
    EmotionalMismatch,
    CharacterInconsistent,
    CharacterStatic,
    ThemeMissing,
    ThemeContradiction,
    DialogueWeak,
    PacingIssue,
}

impl GapType {
    /// The dimension this gap type belongs to.
    #[must_use]
    pub fn dimension(self) -> Dimension {
        match self {
            GapType::EmotionalWeak | GapType::EmotionalMismatch => Dimension::Emotional,
            GapType::CharacterInconsistent | GapType::CharacterStatic => Dimension::Character,
            GapType::ThemeMissing | GapType::ThemeContradiction => Dimension::Thematic,
            GapType::DialogueWeak | GapType::PacingIssue => Dimension::Structural,
        }
    }

    /// The flow id and priority this gap type routes to by default
    /// (spec §4.3 taxonomy table). Lower priority numbers run first.
    #[must_use]
    pub fn default_flow(self) -> (&'static str, u8) {
        match self {
            GapType::EmotionalWeak | GapType::EmotionalMismatch => ("emotional_enrichment", 1),
            GapType::CharacterInconsistent => ("character_consistency", 2),
            GapType::CharacterStatic => ("character_development", 3),
            GapType::ThemeMissing | GapType::ThemeContradiction => ("thematic_weaving", 4),
            GapType::DialogueWeak => ("dialogue_enhancement", 5),
            GapType::PacingIssue => ("pacing_adjustment", 6),
        }
    }
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GapType::EmotionalWeak => "emotional_weak",
            GapType::EmotionalMismatch => "emotional_mismatch",
            GapType::CharacterInconsistent => "character_inconsistent",
            GapType::CharacterStatic => "character_static",
            GapType::ThemeMissing => "theme_missing",
            GapType::ThemeContradiction => "theme_contradiction",
            GapType::DialogueWeak => "dialogue_weak",
            GapType::PacingIssue => "pacing_issue",
        };
        write!(f, "{s}")
    }
}

/// Quality dimension a [`crate::model::Gap`] or sub-score belongs to (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Emotional,
    Character,
    Thematic,
    Structural,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Emotional => "emotional",
            Dimension::Character => "character",
            Dimension::Thematic => "thematic",
            Dimension::Structural => "structural",
        };
        write!(f, "{s}")
    }
}

/// Gap severity bucket, derived from the deficient score (spec §3, §8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    /// `score < 0.3 ⇒ critical; 0.3 ≤ score < 0.5 ⇒ major; else minor`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Severity::Critical
        } else if score < 0.5 {
            Severity::Major
        } else {
            Severity::Minor
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        };
        write!(f, "{s}")
    }
}

/// A free-form improvement area suggested by the emotional classifier
/// (spec §4.1 prompt assembly, §6 classifier contract).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    Stakes,
    Sensory,
    Internal,
    Dialogue,
    Action,
    Pacing,
}

impl ImprovementArea {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "stakes" => Some(Self::Stakes),
            "sensory" => Some(Self::Sensory),
            "internal" => Some(Self::Internal),
            "dialogue" => Some(Self::Dialogue),
            "action" => Some(Self::Action),
            "pacing" => Some(Self::Pacing),
            _ => None,
        }
    }
}

impl fmt::Display for ImprovementArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImprovementArea::Stakes => "stakes",
            ImprovementArea::Sensory => "sensory",
            ImprovementArea::Internal => "internal",
            ImprovementArea::Dialogue => "dialogue",
            ImprovementArea::Action => "action",
            ImprovementArea::Pacing => "pacing",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_round_trips() {
        for kind in [
            NodeKind::NcpLoad,
            NodeKind::GenerateBeat,
            NodeKind::AnalyzeBeat,
            NodeKind::ShouldContinue,
            NodeKind::Output,
            NodeKind::Custom("pacing_adjustment".to_string()),
        ] {
            let encoded = kind.encode();
            assert_eq!(NodeKind::decode(&encoded), kind);
        }
    }

    #[test]
    fn arc_direction_keyword_inference() {
        assert_eq!(
            ArcDirection::from_emotional_tone("hope"),
            ArcDirection::Ascending
        );
        assert_eq!(
            ArcDirection::from_emotional_tone("quiet despair"),
            ArcDirection::Descending
        );
        assert_eq!(
            ArcDirection::from_emotional_tone("a turning point"),
            ArcDirection::Crisis
        );
        assert_eq!(
            ArcDirection::from_emotional_tone("bored"),
            ArcDirection::Static
        );
    }

    #[test]
    fn severity_buckets() {
        assert_eq!(Severity::from_score(0.1), Severity::Critical);
        assert_eq!(Severity::from_score(0.29), Severity::Critical);
        assert_eq!(Severity::from_score(0.3), Severity::Major);
        assert_eq!(Severity::from_score(0.49), Severity::Major);
        assert_eq!(Severity::from_score(0.5), Severity::Minor);
        assert_eq!(Severity::from_score(0.9), Severity::Minor);
    }

    #[test]
    fn gap_type_routes() {
        assert_eq!(
            GapType::EmotionalWeak.default_flow(),
            ("emotional_enrichment", 1)
        );
        assert_eq!(GapType::EmotionalWeak.dimension(), Dimension::Emotional);
        assert_eq!(
            GapType::DialogueWeak.default_flow(),
            ("dialogue_enhancement", 5)
        );
    }
}
