//! Semantic model: declarative schema mapping business concepts (tables,
//! dimensions, measures, metrics, relationships) onto physical SQL.
//!
//! Models are authored as YAML and loaded with [`SemanticModel::from_yaml`].
//! Loading always validates the invariants below; a model that survives
//! `from_yaml` is safe to hand to the resolver and translator.

pub mod dimension;
pub mod measure;
pub mod metric;
pub mod relationship;
pub mod segment;
pub mod table;
pub mod types;

pub use dimension::Dimension;
pub use measure::Measure;
pub use metric::Metric;
pub use relationship::Relationship;
pub use segment::Segment;
pub use table::Table;
pub use types::{Aggregation, DataType, Granularity, RelationshipType};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a [`SemanticModel`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to parse model YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate table key: {0}")]
    DuplicateTable(String),

    #[error("relationship {name:?} references unknown table {table:?}")]
    UnknownRelationshipTable { name: String, table: String },

    #[error("relationship {0:?} must reference two distinct tables")]
    SelfRelationship(String),

    #[error("table {table:?} has duplicate dimension/measure name {name:?}")]
    DuplicateMember { table: String, name: String },

    #[error("table {0:?} participates in a join but has no primary_key dimension")]
    MissingPrimaryKey(String),

    #[error("metric {0:?} has an empty expression")]
    EmptyMetricExpression(String),
}

/// A named, validated schema mapping business concepts to physical SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticModel {
    #[serde(default)]
    pub name: Option<String>,

    /// Tables keyed by their table_key (the name queries/joins address them
    /// by; independent of the physical `Table::name`).
    pub tables: HashMap<String, Table>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,

    #[serde(default)]
    pub metrics: HashMap<String, Metric>,

    #[serde(default)]
    pub dialect: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl SemanticModel {
    /// Load and validate a model from a YAML string.
    pub fn from_yaml(s: &str) -> Result<Self, ModelError> {
        let model: SemanticModel = serde_yaml::from_str(s)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model from a file on disk.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize back to the canonical YAML form. Round-tripping
    /// `from_yaml` -> `to_yaml` -> `from_yaml` is value-preserving up to
    /// map/attribute ordering.
    pub fn to_yaml(&self) -> Result<String, ModelError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the structural invariants every loaded model must satisfy.
    pub fn validate(&self) -> Result<(), ModelError> {
        // HashMap keys are already unique by construction; table_key
        // duplication can only occur from a prior merge step, which calls
        // this after assembling its own map, so re-check defensively there.
        let table_keys: std::collections::HashSet<&str> =
            self.tables.keys().map(String::as_str).collect();

        let mut needs_primary_key: std::collections::HashSet<&str> = std::collections::HashSet::new();

        for rel in &self.relationships {
            if rel.from_table == rel.to_table {
                return Err(ModelError::SelfRelationship(rel.name.clone()));
            }
            if !table_keys.contains(rel.from_table.as_str()) {
                return Err(ModelError::UnknownRelationshipTable {
                    name: rel.name.clone(),
                    table: rel.from_table.clone(),
                });
            }
            if !table_keys.contains(rel.to_table.as_str()) {
                return Err(ModelError::UnknownRelationshipTable {
                    name: rel.name.clone(),
                    table: rel.to_table.clone(),
                });
            }
            // many_to_one/one_to_one require a primary key on the "one" side.
            use types::RelationshipType::*;
            match rel.relationship_type {
                ManyToOne | OneToOne => {
                    needs_primary_key.insert(rel.to_table.as_str());
                }
                _ => {}
            }
        }

        for (key, table) in &self.tables {
            let mut seen = std::collections::HashSet::new();
            for d in &table.dimensions {
                if !seen.insert(d.name.as_str()) {
                    return Err(ModelError::DuplicateMember {
                        table: key.clone(),
                        name: d.name.clone(),
                    });
                }
            }
            for m in &table.measures {
                if !seen.insert(m.name.as_str()) {
                    return Err(ModelError::DuplicateMember {
                        table: key.clone(),
                        name: m.name.clone(),
                    });
                }
            }
            if needs_primary_key.contains(key.as_str()) && table.primary_key().is_none() {
                return Err(ModelError::MissingPrimaryKey(key.clone()));
            }
        }

        for (name, metric) in &self.metrics {
            if metric.expression.trim().is_empty() {
                return Err(ModelError::EmptyMetricExpression(name.clone()));
            }
        }

        Ok(())
    }

    pub fn table_key_for_table(&self, table: &Table) -> Option<&str> {
        self.tables
            .iter()
            .find(|(_, t)| std::ptr::eq(*t, table))
            .map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
tables:
  orders:
    name: orders
    dimensions:
      - name: id
        type: integer
        primary_key: true
      - name: created_at
        type: timestamp
    measures:
      - name: total_revenue
        type: decimal
        aggregation: sum
        expression: amount
  customers:
    name: customers
    dimensions:
      - name: id
        type: integer
        primary_key: true
      - name: region
        type: string
relationships:
  - name: orders_to_customers
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: orders.customer_id = customers.id
metrics:
  avg_order_value:
    expression: orders.total_revenue / orders.order_count
"#
    }

    #[test]
    fn test_load_valid_model() {
        let model = SemanticModel::from_yaml(sample_yaml()).unwrap();
        assert_eq!(model.tables.len(), 2);
        assert_eq!(model.relationships.len(), 1);
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let yaml = r#"
tables:
  orders:
    name: orders
    dimensions:
      - name: customer_id
        type: integer
  customers:
    name: customers
    dimensions:
      - name: id
        type: integer
relationships:
  - name: r
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: orders.customer_id = customers.id
"#;
        let err = SemanticModel::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ModelError::MissingPrimaryKey(_)));
    }

    #[test]
    fn test_unknown_relationship_table_rejected() {
        let yaml = r#"
tables:
  orders:
    name: orders
relationships:
  - name: r
    from_table: orders
    to_table: nonexistent
    type: inner
    join_on: orders.id = nonexistent.id
"#;
        let err = SemanticModel::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ModelError::UnknownRelationshipTable { .. }));
    }

    #[test]
    fn test_roundtrip_yaml() {
        let model = SemanticModel::from_yaml(sample_yaml()).unwrap();
        let yaml = model.to_yaml().unwrap();
        let reloaded = SemanticModel::from_yaml(&yaml).unwrap();
        assert_eq!(model.tables.len(), reloaded.tables.len());
        assert_eq!(model.relationships.len(), reloaded.relationships.len());
    }
}
