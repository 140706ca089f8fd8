//! Segments: named, reusable boolean filter predicates scoped to a table.

use serde::{Deserialize, Serialize};

/// A stored filter predicate, addressed in queries as `<table>.<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// SQL boolean expression, referencing the owning table's columns
    /// unqualified or via `<table_key>.<column>`.
    pub condition: String,

    #[serde(default)]
    pub description: Option<String>,
}
