use std::collections::HashMap;

use uuid::Uuid;
use vantage::model::SemanticModel;
use vantage::semantic::{apply_tenant_aware_context, build_unified_semantic_model, ComposerError};

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
fn merges_disjoint_connector_models_into_one() {
    let sources = vec![
        ("conn_a".to_string(), single_table_model("orders")),
        ("conn_b".to_string(), single_table_model("customers")),
    ];
    let (unified, table_to_connector) =
        build_unified_semantic_model(sources, Vec::new(), HashMap::new()).unwrap();
    assert_eq!(unified.tables.len(), 2);
    assert_eq!(table_to_connector["orders"], "conn_a");
    assert_eq!(table_to_connector["customers"], "conn_b");
}

#[test]
fn rejects_the_same_table_key_from_two_connectors() {
    let sources = vec![
        ("conn_a".to_string(), single_table_model("orders")),
        ("conn_b".to_string(), single_table_model("orders")),
    ];
    let err = build_unified_semantic_model(sources, Vec::new(), HashMap::new()).unwrap_err();
    assert!(matches!(err, ComposerError::DuplicateTable(table) if table == "orders"));
}

#[test]
fn assigns_a_catalog_token_to_tables_with_none() {
    let mut model = single_table_model("orders");
    let org_id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
    let connector_id = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
    apply_tenant_aware_context(&mut model, org_id, connector_id, &HashMap::new());

    let catalog = model.tables["orders"].catalog.as_deref().unwrap();
    assert!(catalog.starts_with("org_"));
    assert!(catalog.contains("__src_"));
}

#[test]
fn splits_a_dotted_schema_into_catalog_and_schema_without_recomputing() {
    let mut model = single_table_model("orders");
    model.tables.get_mut("orders").unwrap().schema = Some("existing_catalog.public".to_string());
    let org_id = Uuid::nil();
    let connector_id = Uuid::nil();
    apply_tenant_aware_context(&mut model, org_id, connector_id, &HashMap::new());

    let table = &model.tables["orders"];
    assert_eq!(table.catalog.as_deref(), Some("existing_catalog"));
    assert_eq!(table.schema.as_deref(), Some("public"));
}
