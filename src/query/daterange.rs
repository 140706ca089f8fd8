//! `date_range` on a [`super::TimeDimension`]: either an explicit
//! `[start, end]` pair, a named preset, or a single-operator form
//! (`before:<d>`, `after:<d>`, `on:<d>`).

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A parsed `date_range` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    /// `[start, end]`, both inclusive ISO date or timestamp strings.
    Absolute { start: String, end: String },

    /// A named preset: `today`, `yesterday`, `last_7_days`, `last_30_days`,
    /// `month_to_date`, `year_to_date`, `last N {day|week|month|quarter|year}`,
    /// `next N ...`, `this|last|next {week|month|quarter|year}`.
    Preset(String),

    /// `before:<d>` / `after:<d>` / `on:<d>`.
    Operator { op: DateRangeOp, date: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeOp {
    Before,
    After,
    On,
}

impl DateRange {
    /// Parse the single-string form: either a named preset or an
    /// `op:date` operator form.
    pub fn parse_str(s: &str) -> Self {
        for (prefix, op) in [
            ("before:", DateRangeOp::Before),
            ("after:", DateRangeOp::After),
            ("on:", DateRangeOp::On),
        ] {
            if let Some(date) = s.strip_prefix(prefix) {
                return DateRange::Operator {
                    op,
                    date: date.trim().to_string(),
                };
            }
        }
        DateRange::Preset(s.to_string())
    }
}

impl Serialize for DateRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DateRange::Absolute { start, end } => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(start)?;
                seq.serialize_element(end)?;
                seq.end()
            }
            DateRange::Preset(s) => serializer.serialize_str(s),
            DateRange::Operator { op, date } => {
                let prefix = match op {
                    DateRangeOp::Before => "before",
                    DateRangeOp::After => "after",
                    DateRangeOp::On => "on",
                };
                serializer.serialize_str(&format!("{prefix}:{date}"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(DateRange::parse_str(&s)),
            serde_json::Value::Array(items) => {
                if items.len() != 2 {
                    return Err(de::Error::custom(
                        "date_range array must have exactly 2 elements",
                    ));
                }
                let start = items[0]
                    .as_str()
                    .ok_or_else(|| de::Error::custom("date_range[0] must be a string"))?
                    .to_string();
                let end = items[1]
                    .as_str()
                    .ok_or_else(|| de::Error::custom("date_range[1] must be a string"))?
                    .to_string();
                Ok(DateRange::Absolute { start, end })
            }
            other => Err(de::Error::custom(format!(
                "date_range must be a string or a 2-element array, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let json = r#"["2024-01-01", "2024-01-31"]"#;
        let dr: DateRange = serde_json::from_str(json).unwrap();
        assert_eq!(
            dr,
            DateRange::Absolute {
                start: "2024-01-01".into(),
                end: "2024-01-31".into()
            }
        );
    }

    #[test]
    fn test_parse_preset() {
        let json = r#""last_7_days""#;
        let dr: DateRange = serde_json::from_str(json).unwrap();
        assert_eq!(dr, DateRange::Preset("last_7_days".into()));
    }

    #[test]
    fn test_parse_operator() {
        let json = r#""before:2024-06-01""#;
        let dr: DateRange = serde_json::from_str(json).unwrap();
        assert_eq!(
            dr,
            DateRange::Operator {
                op: DateRangeOp::Before,
                date: "2024-06-01".into()
            }
        );
    }
}
