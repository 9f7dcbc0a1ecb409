//! The narrative data model (spec §3): beats, arc points, character state,
//! emotional analysis, quality gaps, and the NCP state that threads all of
//! it through a graph run.

mod analysis;
mod arc;
mod beat;
mod gap;
mod ncp;

pub use analysis::EmotionalAnalysis;
pub use arc::{ArcPoint, CharacterArcState, RelationshipState};
pub use beat::StoryBeat;
pub use gap::Gap;
pub use ncp::NCPState;
