//! Member resolution: `<member>` / `<table>.<column>` /
//! `<schema>.<table>.<column>` against a [`SemanticModel`].

use std::collections::HashMap;

use crate::model::{Dimension, Measure, Metric, Segment, SemanticModel};

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("unknown member: {0}")]
    UnknownMember(String),

    #[error("ambiguous member {member:?}: candidates {candidates:?}")]
    Ambiguous {
        member: String,
        candidates: Vec<String>,
    },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("unknown segment: {0}")]
    UnknownSegment(String),
}

/// A member resolved to its owning table and definition.
#[derive(Debug, Clone)]
pub enum ResolvedMember<'a> {
    Dimension {
        table_key: &'a str,
        dimension: &'a Dimension,
    },
    Measure {
        table_key: &'a str,
        measure: &'a Measure,
    },
    Metric {
        name: &'a str,
        metric: &'a Metric,
    },
    Segment {
        table_key: &'a str,
        name: &'a str,
        segment: &'a Segment,
    },
}

impl<'a> ResolvedMember<'a> {
    pub fn table_key(&self) -> Option<&'a str> {
        match self {
            ResolvedMember::Dimension { table_key, .. } => Some(table_key),
            ResolvedMember::Measure { table_key, .. } => Some(table_key),
            ResolvedMember::Segment { table_key, .. } => Some(table_key),
            ResolvedMember::Metric { .. } => None,
        }
    }
}

/// Precomputed indices over a [`SemanticModel`] for O(1)-ish member lookup.
pub struct Resolver<'a> {
    model: &'a SemanticModel,
    /// `"{schema}.{name}"` -> table_key, for schema-qualified compound lookup.
    compound_index: HashMap<String, &'a str>,
    /// bare dimension/measure name -> table_keys that define it.
    dimension_index: HashMap<&'a str, Vec<&'a str>>,
    measure_index: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a SemanticModel) -> Self {
        let mut compound_index = HashMap::new();
        let mut dimension_index: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut measure_index: HashMap<&str, Vec<&str>> = HashMap::new();

        for (table_key, table) in &model.tables {
            if let Some(schema) = &table.schema {
                compound_index.insert(format!("{schema}.{}", table.name), table_key.as_str());
            }
            for d in &table.dimensions {
                for name in d.all_names() {
                    dimension_index.entry(name).or_default().push(table_key);
                }
            }
            for m in &table.measures {
                for name in m.all_names() {
                    measure_index.entry(name).or_default().push(table_key);
                }
            }
        }

        Self {
            model,
            compound_index,
            dimension_index,
            measure_index,
        }
    }

    /// Resolve a dimension or time-dimension member reference.
    pub fn resolve_dimension(&self, member: &str) -> Result<ResolvedMember<'a>, ResolverError> {
        if let Some((table_key, column)) = self.split_qualified(member)? {
            let table = &self.model.tables[table_key];
            return table
                .find_dimension(column)
                .map(|dimension| ResolvedMember::Dimension {
                    table_key,
                    dimension,
                })
                .ok_or_else(|| ResolverError::UnknownMember(member.to_string()));
        }

        let candidates = self.dimension_index.get(member).cloned().unwrap_or_default();
        self.disambiguate(member, candidates, |table_key| {
            self.model.tables[table_key].find_dimension(member).map(|dimension| {
                ResolvedMember::Dimension { table_key, dimension }
            })
        })
    }

    /// Resolve a measure reference, falling back to the metrics namespace
    /// if no measure of that name exists.
    pub fn resolve_measure_or_metric(
        &self,
        member: &str,
    ) -> Result<ResolvedMember<'a>, ResolverError> {
        if let Some((table_key, column)) = self.split_qualified(member)? {
            let table = &self.model.tables[table_key];
            return table
                .find_measure(column)
                .map(|measure| ResolvedMember::Measure { table_key, measure })
                .ok_or_else(|| ResolverError::UnknownMember(member.to_string()));
        }

        let candidates = self.measure_index.get(member).cloned().unwrap_or_default();
        if !candidates.is_empty() {
            return self.disambiguate(member, candidates, |table_key| {
                self.model.tables[table_key]
                    .find_measure(member)
                    .map(|measure| ResolvedMember::Measure { table_key, measure })
            });
        }

        self.resolve_metric(member)
    }

    /// Resolve a name in the metrics namespace only (never falls back).
    pub fn resolve_metric(&self, name: &str) -> Result<ResolvedMember<'a>, ResolverError> {
        self.model
            .metrics
            .get_key_value(name)
            .map(|(name, metric)| ResolvedMember::Metric { name, metric })
            .ok_or_else(|| ResolverError::UnknownMetric(name.to_string()))
    }

    /// Resolve a segment reference `<table>.<name>`.
    pub fn resolve_segment(&self, member: &str) -> Result<ResolvedMember<'a>, ResolverError> {
        let pos = member
            .rfind('.')
            .ok_or_else(|| ResolverError::UnknownSegment(member.to_string()))?;
        let table_part = &member[..pos];
        let name = &member[pos + 1..];

        let table_key = self
            .table_key_for(table_part)
            .ok_or_else(|| ResolverError::UnknownSegment(member.to_string()))?;
        let table = &self.model.tables[table_key];
        table
            .filters
            .get_key_value(name)
            .map(|(name, segment)| ResolvedMember::Segment {
                table_key,
                name,
                segment,
            })
            .ok_or_else(|| ResolverError::UnknownSegment(member.to_string()))
    }

    /// Any member reference: dimension, then measure/metric fallback, then
    /// segment. Used by the base-table selection scan.
    pub fn resolve_any(&self, member: &str) -> Result<ResolvedMember<'a>, ResolverError> {
        self.resolve_dimension(member)
            .or_else(|_| self.resolve_measure_or_metric(member))
            .or_else(|_| self.resolve_segment(member))
    }

    fn table_key_for(&self, qualifier: &str) -> Option<&'a str> {
        if let Some(table_key) = self.model.tables.get_key_value(qualifier).map(|(k, _)| k.as_str())
        {
            return Some(table_key);
        }
        self.compound_index.get(qualifier).copied()
    }

    /// Split a dotted member into `(table_key, column)`, trying the exact
    /// table_key compound first, then the `<schema>.<table>` compound. A
    /// member with no dot returns `Ok(None)` (treat as bare). A qualified
    /// reference that matches neither form is `Err` -- it never degrades to
    /// a bare-name lookup.
    fn split_qualified(&self, member: &str) -> Result<Option<(&'a str, &str)>, ResolverError> {
        let Some(pos) = member.rfind('.') else {
            return Ok(None);
        };
        let table_part = &member[..pos];
        let column = &member[pos + 1..];

        if let Some((table_key, _)) = self.model.tables.get_key_value(table_part) {
            return Ok(Some((table_key.as_str(), column)));
        }

        let segs: Vec<&str> = member.split('.').collect();
        if segs.len() >= 3 {
            let schema_table = format!("{}.{}", segs[0], segs[1]);
            if let Some(table_key) = self.compound_index.get(&schema_table) {
                let column_start = segs[0].len() + segs[1].len() + 2;
                return Ok(Some((table_key, &member[column_start..])));
            }
        }

        Err(ResolverError::UnknownMember(member.to_string()))
    }

    fn disambiguate<F>(
        &self,
        member: &str,
        mut candidates: Vec<&'a str>,
        resolve_in: F,
    ) -> Result<ResolvedMember<'a>, ResolverError>
    where
        F: Fn(&'a str) -> Option<ResolvedMember<'a>>,
    {
        candidates.sort_unstable();
        candidates.dedup();
        match candidates.len() {
            0 => Err(ResolverError::UnknownMember(member.to_string())),
            1 => resolve_in(candidates[0])
                .ok_or_else(|| ResolverError::UnknownMember(member.to_string())),
            _ => Err(ResolverError::Ambiguous {
                member: member.to_string(),
                candidates: candidates.into_iter().map(String::from).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SemanticModel {
        SemanticModel::from_yaml(
            r#"
tables:
  orders:
    name: orders
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: status, type: string}
    measures:
      - {name: total_revenue, type: decimal, aggregation: sum, expression: amount}
    filters:
      paid:
        condition: "status = 'paid'"
  customers:
    name: customers
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: status, type: string}
metrics:
  avg_order_value:
    expression: "orders.total_revenue / orders.order_count"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_qualified_resolution() {
        let model = model();
        let r = Resolver::new(&model);
        let resolved = r.resolve_dimension("orders.status").unwrap();
        assert!(matches!(resolved, ResolvedMember::Dimension { table_key: "orders", .. }));
    }

    #[test]
    fn test_bare_ambiguous_errors() {
        let model = model();
        let r = Resolver::new(&model);
        let err = r.resolve_dimension("status").unwrap_err();
        assert!(matches!(err, ResolverError::Ambiguous { .. }));
    }

    #[test]
    fn test_bare_unambiguous() {
        let model = model();
        let r = Resolver::new(&model);
        let resolved = r.resolve_dimension("id").unwrap_err();
        assert!(matches!(resolved, ResolverError::Ambiguous { .. }));
    }

    #[test]
    fn test_measure_falls_back_to_metric() {
        let model = model();
        let r = Resolver::new(&model);
        let resolved = r.resolve_measure_or_metric("avg_order_value").unwrap();
        assert!(matches!(resolved, ResolvedMember::Metric { .. }));
    }

    #[test]
    fn test_qualified_unknown_never_degrades_to_bare() {
        let model = model();
        let r = Resolver::new(&model);
        let err = r.resolve_dimension("nonexistent_table.status").unwrap_err();
        assert!(matches!(err, ResolverError::UnknownMember(_)));
    }

    #[test]
    fn test_segment_resolution() {
        let model = model();
        let r = Resolver::new(&model);
        let resolved = r.resolve_segment("orders.paid").unwrap();
        assert!(matches!(resolved, ResolvedMember::Segment { .. }));
    }
}
