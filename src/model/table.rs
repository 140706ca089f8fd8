//! Table definitions: the physical-to-business mapping unit of a model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::dimension::Dimension;
use super::measure::Measure;
use super::segment::Segment;

/// A single table in a [`super::SemanticModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Catalog-qualified prefix, assigned by tenant-aware composition
    /// (`org_<12>__src_<12>`) or left as authored by a single-source model.
    #[serde(default)]
    pub catalog: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    pub name: String,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub dimensions: Vec<Dimension>,

    #[serde(default)]
    pub measures: Vec<Measure>,

    /// Named segments, keyed by segment name; addressed in queries as
    /// `<table_key>.<name>`.
    #[serde(default)]
    pub filters: HashMap<String, Segment>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Table {
    /// The fully dialect-qualified reference for this table:
    /// `catalog.schema.name`, `schema.name`, or bare `name`.
    pub fn qualified_name(&self) -> String {
        match (&self.catalog, &self.schema) {
            (Some(c), Some(s)) => format!("{c}.{s}.{}", self.name),
            (None, Some(s)) => format!("{s}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn find_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions
            .iter()
            .find(|d| d.all_names().any(|n| n == name))
    }

    pub fn find_measure(&self, name: &str) -> Option<&Measure> {
        self.measures
            .iter()
            .find(|m| m.all_names().any(|n| n == name))
    }

    pub fn primary_key(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.primary_key)
    }
}
