//! The semantic query AST.

use serde::{Deserialize, Serialize};

use super::daterange::DateRange;
use crate::model::Granularity;

/// A member reference: a bare name, `<table>.<column>`, or
/// `<schema>.<table>.<column>`.
pub type MemberRef = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl Default for OrderDirection {
    fn default() -> Self {
        OrderDirection::Asc
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub member: MemberRef,
    #[serde(default)]
    pub direction: OrderDirection,
}

/// Filter operators over a dimension, measure, metric, or time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    BeforeDate,
    AfterDate,
    InDateRange,
    NotInDateRange,
    Set,
    NotSet,
    In,
    NotIn,
}

impl FilterOperator {
    /// Operators that take no `values` (`set`/`notSet`).
    pub fn is_nullary(&self) -> bool {
        matches!(self, FilterOperator::Set | FilterOperator::NotSet)
    }
}

/// A single filter predicate: a dimension/segment filter compiles to
/// `WHERE`; a measure/metric filter compiles to `HAVING`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    pub member: MemberRef,

    pub operator: FilterOperator,

    #[serde(default)]
    pub values: Vec<String>,
}

/// A requested time dimension with optional granularity and date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimension {
    pub dimension: MemberRef,

    #[serde(default)]
    pub granularity: Option<Granularity>,

    #[serde(default)]
    pub date_range: Option<DateRange>,
}

/// The complete semantic query request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SemanticQuery {
    #[serde(default)]
    pub measures: Vec<MemberRef>,

    #[serde(default)]
    pub dimensions: Vec<MemberRef>,

    #[serde(default)]
    pub time_dimensions: Vec<TimeDimension>,

    #[serde(default)]
    pub filters: Vec<FilterItem>,

    /// Segment references, `<table>.<filter>`.
    #[serde(default)]
    pub segments: Vec<MemberRef>,

    #[serde(default)]
    pub order: Vec<Order>,

    #[serde(default)]
    pub limit: Option<u32>,

    #[serde(default)]
    pub offset: Option<u32>,

    #[serde(default)]
    pub timezone: Option<String>,
}

impl SemanticQuery {
    /// All members referenced anywhere in the query, in the order the
    /// resolver should encounter them for base-table selection.
    pub fn all_member_refs(&self) -> impl Iterator<Item = &str> {
        self.measures
            .iter()
            .chain(self.dimensions.iter())
            .chain(self.time_dimensions.iter().map(|t| &t.dimension))
            .chain(self.filters.iter().map(|f| &f.member))
            .chain(self.segments.iter())
            .map(String::as_str)
    }
}
