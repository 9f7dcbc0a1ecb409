//! Top-level error composition for the engine.
//!
//! Each subsystem defines its own small, specific error enum — see
//! `NodeError`/`NodeContextError` in the graph module. This
//! module only composes them into one type so a caller driving the whole
//! pipeline through [`crate::graph::GraphRunner`] has a single `Result` to
//! handle, via `#[from]` conversions rather than a hand-rolled match.

use miette::Diagnostic;
use thiserror::Error;

use crate::generator::GeneratorError;
use crate::graph::GraphError;
use crate::llm::LlmError;

/// Errors that can escape the public API of the engine.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),
}
