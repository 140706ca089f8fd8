//! Shared scalar types used across the semantic model.

use serde::{Deserialize, Serialize};

/// Logical data type of a dimension or measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Float,
    Date,
    Timestamp,
    Boolean,
}

impl DataType {
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::Boolean => "boolean",
        };
        write!(f, "{s}")
    }
}

/// Aggregation function applied to a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    CountDistinct,
    None,
}

impl Aggregation {
    /// The SQL function name for this aggregation, or `None` for bare `none`.
    pub fn sql_function(&self) -> Option<&'static str> {
        match self {
            Aggregation::Sum => Some("SUM"),
            Aggregation::Avg => Some("AVG"),
            Aggregation::Min => Some("MIN"),
            Aggregation::Max => Some("MAX"),
            Aggregation::Count => Some("COUNT"),
            Aggregation::CountDistinct => Some("COUNT"),
            Aggregation::None => None,
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, Aggregation::CountDistinct)
    }
}

/// Relationship kind between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Inner,
    Left,
    Right,
    Full,
    OneToMany,
    ManyToOne,
    OneToOne,
}

impl RelationshipType {
    /// Map a relationship type to the JOIN kind the translator emits.
    /// `one_to_many|many_to_one|one_to_one` compile to LEFT per §4.1.
    pub fn join_kind(&self) -> crate::sql::query::JoinType {
        use crate::sql::query::JoinType;
        match self {
            RelationshipType::Inner => JoinType::Inner,
            RelationshipType::Left => JoinType::Left,
            RelationshipType::Right => JoinType::Right,
            RelationshipType::Full => JoinType::Full,
            RelationshipType::OneToMany | RelationshipType::ManyToOne | RelationshipType::OneToOne => {
                JoinType::Left
            }
        }
    }
}

/// Calendar/time granularity for time dimensions and `date_trunc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_sql_unit(&self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "second" => Some(Granularity::Second),
            "minute" => Some(Granularity::Minute),
            "hour" => Some(Granularity::Hour),
            "day" => Some(Granularity::Day),
            "week" => Some(Granularity::Week),
            "month" => Some(Granularity::Month),
            "quarter" => Some(Granularity::Quarter),
            "year" => Some(Granularity::Year),
            _ => None,
        }
    }
}
