//! Member resolution, join planning, and multi-source model composition.

pub mod composer;
pub mod graph;
pub mod resolver;

pub use composer::{apply_tenant_aware_context, build_unified_semantic_model, ComposerError};
pub use graph::{GraphError, JoinGraph, JoinStep};
pub use resolver::{ResolvedMember, Resolver, ResolverError};
