//! NCP-Aware Generator (spec §4.1).
//!
//! Produces one [`StoryBeat`] at a time: assembles a labeled prompt from the
//! current [`NCPState`] and character-arc context, invokes the LLM, and
//! tolerantly parses the XML wire format back into structured fields.

use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::character_arc::CharacterArcTracker;
use crate::llm::{LlmAdapter, LlmError};
use crate::model::{ArcPoint, NCPState, StoryBeat};
use crate::types::ArcDirection;

const RESPONSE_FORMAT_INSTRUCTION: &str = "RESPOND using exactly these XML tags: \
    <dialogue>...</dialogue> <action>...</action> <internal>...</internal> \
    <emotional_tone>single word</emotional_tone> \
    <theme_resonance>free text</theme_resonance>. Use \"None\" for any field \
    that does not apply.";

const CEREMONIAL_MODE_INSTRUCTION: &str =
    "CEREMONIAL MODE: honor the witnessing frame established for this session.";

#[derive(Debug, Error, Diagnostic)]
pub enum GeneratorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),
}

/// Overrides a caller may supply for a single beat, on top of whatever the
/// current [`NCPState`] implies (spec §4.1 "optional overrides").
#[derive(Clone, Debug, Default)]
pub struct GenerationOverrides {
    pub character_id: Option<String>,
    pub character_name: Option<String>,
    pub theme: Option<String>,
    pub emotional_target: Option<String>,
}

/// Produces beats against the current narrative context.
pub struct NcpAwareGenerator {
    llm: Arc<dyn LlmAdapter>,
    context_depth: usize,
    ceremonial_mode: bool,
    ncp_aware: bool,
}

impl NcpAwareGenerator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmAdapter>, context_depth: usize, ceremonial_mode: bool) -> Self {
        Self::with_ncp_awareness(llm, context_depth, ceremonial_mode, true)
    }

    /// As [`Self::new`], but `ncp_aware` controls whether
    /// [`Self::assemble_prompt`] includes character-arc context and
    /// recent-beats history (the `ncp_aware_generation` config knob) or
    /// falls back to a bare perspective-plus-instruction prompt.
    #[must_use]
    pub fn with_ncp_awareness(
        llm: Arc<dyn LlmAdapter>,
        context_depth: usize,
        ceremonial_mode: bool,
        ncp_aware: bool,
    ) -> Self {
        Self {
            llm,
            context_depth,
            ceremonial_mode,
            ncp_aware,
        }
    }

    /// Assemble the labeled prompt described in spec §4.1: perspective
    /// declaration, character arc context, narrative-moment block,
    /// recent-beats excerpt, and the XML response-format instruction. When
    /// `ncp_aware_generation` is disabled, only the perspective declaration,
    /// the caller's prompt, and the response-format instruction are sent.
    #[must_use]
    pub fn assemble_prompt(
        &self,
        ncp: &NCPState,
        tracker: &CharacterArcTracker,
        prompt: &str,
        overrides: &GenerationOverrides,
    ) -> String {
        let character_id = overrides
            .character_id
            .clone()
            .or_else(|| ncp.active_perspective.clone())
            .unwrap_or_else(|| "narrator".to_string());
        let theme = overrides
            .theme
            .clone()
            .or_else(|| ncp.active_theme.clone())
            .unwrap_or_default();

        let mut sections = Vec::new();
        sections.push(format!("PERSPECTIVE: {character_id}"));

        if !self.ncp_aware {
            sections.push(prompt.to_string());
            sections.push(RESPONSE_FORMAT_INSTRUCTION.to_string());
            if self.ceremonial_mode {
                sections.push(CEREMONIAL_MODE_INSTRUCTION.to_string());
            }
            return sections.join("\n\n");
        }

        if let Some(context) = tracker.get_arc_context(&character_id, self.context_depth) {
            sections.push(format!("CHARACTER ARC CONTEXT:\n{context}"));
        }

        sections.push(format!(
            "NARRATIVE MOMENT:\nPhase: {}\nTheme: {theme}\nEmotional target: {}\nTension: {:.2}",
            ncp.dramatic_phase,
            overrides.emotional_target.as_deref().unwrap_or("unspecified"),
            ncp.tension_level,
        ));

        let recent: Vec<&str> = ncp
            .beats
            .iter()
            .rev()
            .take(3)
            .map(|b| b.raw_text.as_str())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if !recent.is_empty() {
            sections.push(format!("RECENT BEATS:\n{}", recent.join("\n---\n")));
        }

        sections.push(prompt.to_string());

        sections.push(RESPONSE_FORMAT_INSTRUCTION.to_string());

        if self.ceremonial_mode {
            sections.push(CEREMONIAL_MODE_INSTRUCTION.to_string());
        }

        sections.join("\n\n")
    }

    /// Generate one beat, update `ncp` in place, and return an [`ArcPoint`]
    /// if the perspective character is known to `tracker` (spec §4.1 "State
    /// update on success"). LLM failures never raise: the generator
    /// produces a beat with empty `raw_text` instead (spec §4.1 "Failure
    /// semantics", spec §7).
    pub async fn generate_beat(
        &self,
        ncp: &mut NCPState,
        tracker: &mut CharacterArcTracker,
        prompt: &str,
        overrides: GenerationOverrides,
    ) -> StoryBeat {
        let character_id = overrides
            .character_id
            .clone()
            .or_else(|| ncp.active_perspective.clone())
            .unwrap_or_else(|| "narrator".to_string());
        let character_name = overrides
            .character_name
            .clone()
            .unwrap_or_else(|| character_id.clone());

        let assembled = self.assemble_prompt(ncp, tracker, prompt, &overrides);
        let beat_index = ncp.current_beat_index;

        let mut beat = StoryBeat::new(beat_index, character_id.clone(), character_name);

        match self.llm.generate(&assembled).await {
            Ok(response) => {
                parse_beat_xml_into(&response, &mut beat);
            }
            Err(_) => {
                // spec §4.1/§7: swallow the failure, leave raw_text empty so
                // the analyzer flags it with a critical gap.
            }
        }

        ncp.append_beat(beat.clone());

        if let Some(point) = tracker.record_beat_impact(&beat, &character_id) {
            let _ = point;
        }

        beat
    }
}

/// Tolerant extraction of the wire XML described in spec §6: case-sensitive
/// tag names, `.` matches newline, values equal to "none" (any case) become
/// `None`. Unknown tags are ignored; missing tags leave the field `None`.
/// If nothing parses, the raw response becomes `raw_text` and structured
/// fields stay `None` — the beat is still produced (spec §4.1 "Beat
/// parsing").
fn parse_beat_xml_into(response: &str, beat: &mut StoryBeat) {
    let dialogue = extract_tag(response, "dialogue");
    let action = extract_tag(response, "action");
    let internal = extract_tag(response, "internal");
    let emotional_tone = extract_tag(response, "emotional_tone");
    let theme_resonance = extract_tag(response, "theme_resonance");

    beat.dialogue = normalize_none(dialogue);
    beat.action = normalize_none(action);
    beat.internal = normalize_none(internal);
    beat.emotional_tone = normalize_none(emotional_tone);
    beat.theme_resonance = normalize_none(theme_resonance);

    beat.raw_text = response.trim().to_string();
}

fn normalize_none(value: Option<String>) -> Option<String> {
    match value {
        Some(v) if v.trim().eq_ignore_ascii_case("none") => None,
        Some(v) => Some(v.trim().to_string()),
        None => None,
    }
}

/// Extract the content of the first `<tag>...</tag>` occurrence, matching
/// dot-matches-newline semantics by scanning for literal delimiters rather
/// than relying on a regex crate.
fn extract_tag(haystack: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = haystack.find(&open)? + open.len();
    let end = haystack[start..].find(&close)? + start;
    Some(haystack[start..end].trim().to_string())
}

/// Standalone beat-id/arc-point reconstruction used by the graph's
/// `generate_beat` node when it needs an arc direction without a tracker
/// handy (kept for unit testing the keyword inference independent of
/// [`CharacterArcTracker`]).
#[must_use]
pub fn infer_arc_point(beat: &StoryBeat) -> ArcPoint {
    let tone = beat.emotional_tone.as_deref().unwrap_or("static");
    ArcPoint::new(
        beat.beat_id,
        beat.beat_index,
        tone,
        ArcDirection::from_emotional_tone(tone),
        0.3,
    )
}

/// Re-exported for callers constructing standalone beats in tests or demos.
#[must_use]
pub fn new_beat_id() -> Uuid {
    Uuid::new_v4()
}
