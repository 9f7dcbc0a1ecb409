//! Fluent construction of a [`GraphRunner`] (spec §4.5 "extensible via
//! `add_node`").

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::enrichment::EmotionalBeatEnricher;
use crate::event_bus::{EventEmitter, TracingEventEmitter};
use crate::feedback::{AnalyticalFeedbackLoop, FlowRegistry, FlowRoute};
use crate::generator::NcpAwareGenerator;
use crate::graph::node::Node;
use crate::graph::nodes::{AnalyzeBeatNode, GenerateBeatNode, NcpLoadNode, OutputNode, ShouldContinueNode};
use crate::graph::runner::GraphRunner;
use crate::llm::LlmAdapter;
use crate::types::NodeKind;

pub struct GraphBuilder {
    llm: Arc<dyn LlmAdapter>,
    config: EngineConfig,
    event_emitter: Arc<dyn EventEmitter>,
    custom_routes: Vec<FlowRoute>,
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmAdapter>) -> Self {
        Self {
            llm,
            config: EngineConfig::default(),
            event_emitter: Arc::new(TracingEventEmitter),
            custom_routes: Vec::new(),
            nodes: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = emitter;
        self
    }

    /// Register an additional remediation flow with the default analytical
    /// feedback loop (spec §4.3 "Extensibility").
    #[must_use]
    pub fn register_flow(mut self, route: FlowRoute) -> Self {
        self.custom_routes.push(route);
        self
    }

    /// Install or override a node for a built-in [`NodeKind`] (spec §4.5
    /// "extensible via `add_node`").
    #[must_use]
    pub fn add_node(mut self, kind: NodeKind, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(kind, node);
        self
    }

    /// Register a custom node under [`NodeKind::Custom`].
    #[must_use]
    pub fn add_custom_node(self, name: impl Into<String>, node: Arc<dyn Node>) -> Self {
        self.add_node(NodeKind::Custom(name.into()), node)
    }

    #[must_use]
    pub fn build(self) -> GraphRunner {
        let mut nodes = self.nodes;

        nodes
            .entry(NodeKind::NcpLoad)
            .or_insert_with(|| Arc::new(NcpLoadNode) as Arc<dyn Node>);
        nodes.entry(NodeKind::GenerateBeat).or_insert_with(|| {
            Arc::new(GenerateBeatNode::new(NcpAwareGenerator::with_ncp_awareness(
                Arc::clone(&self.llm),
                self.config.character_context_depth,
                self.config.ceremonial_mode,
                self.config.ncp_aware_generation,
            ))) as Arc<dyn Node>
        });
        nodes.entry(NodeKind::AnalyzeBeat).or_insert_with(|| {
            let remediation_enricher = Arc::new(EmotionalBeatEnricher::new(Arc::clone(&self.llm)));
            let mut registry = FlowRegistry::new_default_registry_with_enricher(
                remediation_enricher,
                self.config.emotional_quality_threshold,
                self.config.enrichment_max_iterations,
                self.config.enrichment_min_improvement,
                self.config.preserve_length_tolerance,
            );
            for route in self.custom_routes.clone() {
                registry.register_flow(route);
            }
            Arc::new(AnalyzeBeatNode::new(
                EmotionalBeatEnricher::new(Arc::clone(&self.llm)),
                AnalyticalFeedbackLoop::with_registry(registry),
            )) as Arc<dyn Node>
        });
        nodes
            .entry(NodeKind::ShouldContinue)
            .or_insert_with(|| Arc::new(ShouldContinueNode) as Arc<dyn Node>);
        nodes
            .entry(NodeKind::Output)
            .or_insert_with(|| Arc::new(OutputNode) as Arc<dyn Node>);

        GraphRunner::new(nodes, Arc::new(self.config), self.event_emitter)
    }
}
