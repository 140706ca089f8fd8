//! Unified model composition: merge per-connector semantic models into a
//! single federated model, and assign tenant-aware catalog tokens.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{Relationship, SemanticModel};

#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error("duplicate table key {0:?} across source models")]
    DuplicateTable(String),

    #[error(transparent)]
    Model(#[from] crate::model::ModelError),
}

/// Merge `sources` (one model per connector) into a single model, returning
/// the merged model plus a `table_key -> source_connector_id` map.
///
/// `extra_joins`/`extra_metrics` are appended after the merge (cross-source
/// relationships/metrics that reference tables from more than one source).
pub fn build_unified_semantic_model(
    sources: Vec<(String, SemanticModel)>,
    extra_joins: Vec<Relationship>,
    extra_metrics: HashMap<String, crate::model::Metric>,
) -> Result<(SemanticModel, HashMap<String, String>), ComposerError> {
    let mut tables = HashMap::new();
    let mut relationships = Vec::new();
    let mut metrics = HashMap::new();
    let mut table_to_connector = HashMap::new();
    let mut tags: Vec<String> = Vec::new();

    for (connector_id, model) in sources {
        for (table_key, table) in model.tables {
            if tables.contains_key(&table_key) {
                return Err(ComposerError::DuplicateTable(table_key));
            }
            table_to_connector.insert(table_key.clone(), connector_id.clone());
            tables.insert(table_key, table);
        }
        relationships.extend(model.relationships);
        for (name, metric) in model.metrics {
            metrics.insert(name, metric);
        }
        for tag in model.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    relationships.extend(extra_joins);
    metrics.extend(extra_metrics);

    let unified = SemanticModel {
        name: Some("unified".to_string()),
        tables,
        relationships,
        metrics,
        dialect: None,
        tags,
        description: None,
    };
    unified.validate()?;

    Ok((unified, table_to_connector))
}

/// Assign a `org_<12-hex>__src_<12-hex>` catalog token to every table that
/// doesn't already carry a catalog, using the first 12 hex characters of
/// each UUID's hyphen-free (simple) rendering. Tables whose `schema`
/// already contains a dot are split into `(catalog, schema)` and the
/// existing catalog is preserved rather than recomputed.
pub fn apply_tenant_aware_context(
    model: &mut SemanticModel,
    org_id: Uuid,
    execution_connector_id: Uuid,
    connector_map: &HashMap<String, Uuid>,
) {
    for (table_key, table) in model.tables.iter_mut() {
        if table.catalog.is_some() {
            continue;
        }

        if let Some(schema) = &table.schema {
            if let Some(dot) = schema.find('.') {
                let (catalog, rest) = schema.split_at(dot);
                table.catalog = Some(catalog.to_string());
                table.schema = Some(rest[1..].to_string());
                continue;
            }
        }

        let connector_id = connector_map
            .get(table_key)
            .copied()
            .unwrap_or(execution_connector_id);
        table.catalog = Some(catalog_token(org_id, connector_id));
    }
}

fn catalog_token(org_id: Uuid, connector_id: Uuid) -> String {
    let org_hex = org_id.simple().to_string();
    let src_hex = connector_id.simple().to_string();
    format!("org_{}__src_{}", &org_hex[..12], &src_hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_table_model(name: &str) -> SemanticModel {
        SemanticModel::from_yaml(&format!(
            r#"
tables:
  {name}:
    name: {name}
"#
        ))
        .unwrap()
    }

    #[test]
    fn test_merge_disjoint_models() {
        let sources = vec![
            ("conn_a".to_string(), single_table_model("orders")),
            ("conn_b".to_string(), single_table_model("customers")),
        ];
        let (unified, map) =
            build_unified_semantic_model(sources, Vec::new(), HashMap::new()).unwrap();
        assert_eq!(unified.tables.len(), 2);
        assert_eq!(map["orders"], "conn_a");
        assert_eq!(map["customers"], "conn_b");
    }

    #[test]
    fn test_merge_duplicate_table_key_errors() {
        let sources = vec![
            ("conn_a".to_string(), single_table_model("orders")),
            ("conn_b".to_string(), single_table_model("orders")),
        ];
        let err = build_unified_semantic_model(sources, Vec::new(), HashMap::new()).unwrap_err();
        assert!(matches!(err, ComposerError::DuplicateTable(_)));
    }

    #[test]
    fn test_catalog_token_format() {
        let org = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let conn = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
        let token = catalog_token(org, conn);
        assert_eq!(token, "org_111111111111__src_222222222222");
    }

    #[test]
    fn test_existing_dotted_schema_preserved() {
        let mut model = single_table_model("orders");
        model.tables.get_mut("orders").unwrap().schema = Some("mycatalog.public".to_string());
        let org = Uuid::new_v4();
        let conn = Uuid::new_v4();
        apply_tenant_aware_context(&mut model, org, conn, &HashMap::new());
        let table = &model.tables["orders"];
        assert_eq!(table.catalog.as_deref(), Some("mycatalog"));
        assert_eq!(table.schema.as_deref(), Some("public"));
    }
}
