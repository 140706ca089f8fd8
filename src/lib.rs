//! # Vantage
//!
//! An analytics platform core: a declarative semantic model compiled to
//! multi-dialect SQL, plus a multi-agent orchestrator that plans, executes,
//! and reasons over analyst/research/visual/web-search tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   SemanticModel (tables, dimensions, measures, metrics)  │  model
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolve + join-plan]
//! ┌─────────────────────────────────────────────────────────┐
//! │         Resolver & Join Graph (member -> table)          │  semantic
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translate]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SemanticQuery AST -> dialect-qualified SQL         │  query, sql
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Analyst tool]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Planner/Router -> Supervisor -> Reasoning Controller    │  orchestrator
//! │        dispatching Analyst / Visual / Research / Web      │  agents
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [async jobs]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Worker Job Lifecycle (claim/lease)           │  worker
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod agents;
pub mod capability;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod query;
pub mod semantic;
pub mod sql;
pub mod translate;
pub mod worker;

pub use error::VantageError;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::VantageError;
    pub use crate::model::{
        Aggregation, DataType, Dimension, Granularity, Measure, Metric, Relationship,
        RelationshipType, Segment, SemanticModel, Table,
    };
    pub use crate::query::{
        FilterItem, FilterOperator, Order, OrderDirection, SemanticQuery, TimeDimension,
    };
    pub use crate::sql::dialect::{Dialect, SqlDialect};
    pub use crate::sql::expr::{
        col, count, count_distinct, count_star, func, lit_bool, lit_float, lit_int, lit_null,
        lit_str, sum, table_col, Expr, ExprExt,
    };
    pub use crate::sql::query::{Query, SelectExpr, TableRef};
    pub use crate::sql::token::{Token, TokenStream};
    pub use crate::translate::{compile, TranslateError};
    pub use crate::orchestrator::{Plan, PlanAgent, PlanningConstraints, Route, Supervisor};
    pub use crate::worker::{JobRecord, JobStatus, Worker};
}
