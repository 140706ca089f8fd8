//! Relationships (joins) between tables.

use serde::{Deserialize, Serialize};

use super::types::RelationshipType;

/// A named join between two tables in the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,

    pub from_table: String,

    pub to_table: String,

    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// SQL boolean expression referencing `<table_key>.<column>` on both
    /// sides, e.g. `orders.customer_id = customers.id`.
    pub join_on: String,
}

impl Relationship {
    /// The other table key, given one endpoint.
    pub fn other(&self, table_key: &str) -> Option<&str> {
        if self.from_table == table_key {
            Some(&self.to_table)
        } else if self.to_table == table_key {
            Some(&self.from_table)
        } else {
            None
        }
    }
}
