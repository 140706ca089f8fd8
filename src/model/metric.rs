//! Metrics: reusable SQL expressions spanning multiple measures/dimensions.

use serde::{Deserialize, Serialize};

/// A named metric expression, resolved in its own namespace (§ resolution
/// rules: metrics never fall back to measures, but measures fall back to
/// metrics when a bare name isn't found among measures).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// SQL expression, typically composing one or more `<table>.<measure>`
    /// references, e.g. `orders.total_revenue / orders.order_count`.
    pub expression: String,

    #[serde(default)]
    pub description: Option<String>,
}
