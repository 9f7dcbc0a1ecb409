//! Engine configuration knobs (spec §4.5 "Config knobs").

/// Every tunable the graph orchestrator and its collaborators read.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub max_beats: u32,
    pub min_quality: f64,
    pub gap_threshold: f64,
    pub max_gaps_per_beat: usize,
    pub auto_remediate: bool,
    pub emotional_quality_threshold: f64,
    pub enrichment_max_iterations: u32,
    pub enrichment_min_improvement: f64,
    pub preserve_length_tolerance: f64,
    pub character_context_depth: usize,
    pub ncp_aware_generation: bool,
    pub ceremonial_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_beats: 10,
            min_quality: 0.6,
            gap_threshold: 0.6,
            max_gaps_per_beat: 3,
            auto_remediate: true,
            emotional_quality_threshold: 0.75,
            enrichment_max_iterations: 3,
            enrichment_min_improvement: 0.05,
            preserve_length_tolerance: 0.20,
            character_context_depth: 3,
            ncp_aware_generation: true,
            ceremonial_mode: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Fluent builder over [`EngineConfig`]: small `with_*` setters returning
/// `Self`, ending in [`EngineConfigBuilder::build`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

macro_rules! with_field {
    ($name:ident, $ty:ty) => {
        #[must_use]
        pub fn $name(mut self, value: $ty) -> Self {
            self.config.$name = value;
            self
        }
    };
}

impl EngineConfigBuilder {
    with_field!(max_beats, u32);
    with_field!(min_quality, f64);
    with_field!(gap_threshold, f64);
    with_field!(max_gaps_per_beat, usize);
    with_field!(auto_remediate, bool);
    with_field!(emotional_quality_threshold, f64);
    with_field!(enrichment_max_iterations, u32);
    with_field!(enrichment_min_improvement, f64);
    with_field!(preserve_length_tolerance, f64);
    with_field!(character_context_depth, usize);
    with_field!(ncp_aware_generation, bool);
    with_field!(ceremonial_mode, bool);

    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = EngineConfig::default();
        assert_eq!(config.max_beats, 10);
        assert_eq!(config.min_quality, 0.6);
        assert_eq!(config.emotional_quality_threshold, 0.75);
        assert_eq!(config.enrichment_max_iterations, 3);
        assert!(config.auto_remediate);
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = EngineConfig::builder().max_beats(5).auto_remediate(false).build();
        assert_eq!(config.max_beats, 5);
        assert!(!config.auto_remediate);
        assert_eq!(config.min_quality, 0.6);
    }
}
