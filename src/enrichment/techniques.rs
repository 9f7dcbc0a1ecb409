//! The improvement-area → technique-list map referenced by the enrichment
//! prompt builder (spec §4.2 step 3).

use crate::types::ImprovementArea;

/// Candidate rewrite techniques for one improvement area, in priority order.
#[must_use]
pub fn techniques_for(area: ImprovementArea) -> &'static [&'static str] {
    match area {
        ImprovementArea::Stakes => &[
            "make explicit what the character stands to lose in this moment",
            "tie the immediate action to a consequence the reader already cares about",
        ],
        ImprovementArea::Sensory => &[
            "ground the passage in one concrete sensory detail (sight, sound, touch)",
            "replace an abstract feeling-word with a physical sensation that implies it",
        ],
        ImprovementArea::Internal => &[
            "surface one unspoken thought that contradicts the character's outward action",
            "let the internal monologue name the fear driving the external behavior",
        ],
        ImprovementArea::Dialogue => &[
            "give the line subtext: say one thing, mean another",
            "cut exposition from the dialogue and let action carry it instead",
        ],
        ImprovementArea::Action => &[
            "replace a static description with a small, specific physical action",
            "let the character's movement reveal their emotional state instead of stating it",
        ],
        ImprovementArea::Pacing => &[
            "shorten sentences at the emotional peak to quicken the rhythm",
            "cut one clause that restates something the reader already knows",
        ],
    }
}

/// Collect up to `limit` technique instructions across `areas`, preserving
/// area order and technique order within each area (spec §4.2: "up to six
/// technique instructions").
#[must_use]
pub fn collect_instructions(areas: &[ImprovementArea], limit: usize) -> Vec<&'static str> {
    let mut out = Vec::new();
    for area in areas {
        for technique in techniques_for(*area) {
            if out.len() >= limit {
                return out;
            }
            out.push(*technique);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_instructions_respects_limit() {
        let areas = [
            ImprovementArea::Stakes,
            ImprovementArea::Sensory,
            ImprovementArea::Internal,
            ImprovementArea::Dialogue,
        ];
        let collected = collect_instructions(&areas, 6);
        assert!(collected.len() <= 6);
        assert!(!collected.is_empty());
    }
}
