//! Dimension definitions: categorical or temporal attributes of a table.

use serde::{Deserialize, Serialize};

use super::types::DataType;

/// A single dimension attached to a [`super::table::Table`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    /// SQL expression for this dimension. Defaults to the bare column name
    /// (`name`) when omitted.
    #[serde(default)]
    pub expression: Option<String>,

    #[serde(default)]
    pub primary_key: bool,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether this dimension's values are embedded for semantic (vector)
    /// lookup during member resolution.
    #[serde(default)]
    pub vectorized: bool,

    #[serde(default)]
    pub vector_index: Option<String>,
}

impl Dimension {
    /// The SQL expression to select, falling back to the column name.
    pub fn sql_expression(&self) -> &str {
        self.expression.as_deref().unwrap_or(&self.name)
    }

    /// All names this dimension can be addressed by: its own name plus
    /// registered synonyms.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}
