//! Analytical Feedback Loop (spec §4.3).

mod flows;
mod loop_runner;
mod scoring;

pub use flows::{Enrichment, FlowHandler, FlowRegistry, FlowRoute};
pub use loop_runner::{AnalyticalFeedbackLoop, FeedbackLoopError, ProcessedBeat};
pub use scoring::{score_all, DimensionScores};
