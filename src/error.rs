//! Crate-level error aggregation.
//!
//! Only [`VantageError::BusinessValidation`] and [`VantageError::SemanticModel`]
//! ever propagate to the request boundary; every other variant is captured
//! into structured diagnostics by the component that produced it (the
//! analyst tool, the worker dispatch loop) and never bubbles past its own
//! boundary as a hard error.

use thiserror::Error;

use crate::capability::completer::ToolProviderError;
use crate::model::ModelError;
use crate::semantic::{GraphError, ResolverError};
use crate::translate::TranslateError;

#[derive(Debug, Error)]
pub enum VantageError {
    #[error("business validation failed: {0}")]
    BusinessValidation(String),

    #[error("semantic model error: {0}")]
    SemanticModel(#[from] ModelError),

    #[error("no join path between the referenced tables: {0}")]
    Unreachable(#[from] GraphError),

    #[error("member resolution failed: {0}")]
    Resolution(#[from] ResolverError),

    #[error("SQL transpile failed: {0}")]
    TranspileError(#[from] TranslateError),

    #[error("query execution failed: {0}")]
    ExecutionError(String),

    #[error("tool provider error: {0}")]
    ToolProviderError(#[from] ToolProviderError),

    #[error("job lease expired or conflicted: {0}")]
    LeaseConflict(String),
}
