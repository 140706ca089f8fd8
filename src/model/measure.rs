//! Measure definitions: aggregatable numeric facts on a table.

use serde::{Deserialize, Serialize};

use super::types::{Aggregation, DataType};

/// A single measure attached to a [`super::table::Table`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    pub aggregation: Aggregation,

    /// SQL expression to aggregate. Defaults to the bare column name
    /// (`name`) when omitted.
    #[serde(default)]
    pub expression: Option<String>,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Measure {
    pub fn sql_expression(&self) -> &str {
        self.expression.as_deref().unwrap_or(&self.name)
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}
