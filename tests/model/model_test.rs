use vantage::model::{ModelError, SemanticModel};

fn sample_yaml() -> &'static str {
    r#"
name: sales
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
fn loads_and_validates_a_well_formed_model() {
    let model = SemanticModel::from_yaml(sample_yaml()).unwrap();
    assert_eq!(model.name.as_deref(), Some("sales"));
    assert_eq!(model.tables.len(), 2);
    assert_eq!(model.relationships.len(), 1);
    assert!(model.metrics.contains_key("avg_order_value"));
}

#[test]
fn round_trips_through_yaml() {
    let model = SemanticModel::from_yaml(sample_yaml()).unwrap();
    let yaml = model.to_yaml().unwrap();
    let reloaded = SemanticModel::from_yaml(&yaml).unwrap();
    assert_eq!(reloaded.tables.len(), model.tables.len());
    assert_eq!(reloaded.relationships.len(), model.relationships.len());
}

#[test]
fn rejects_relationship_to_unknown_table() {
    let yaml = r#"
tables:
  orders:
    name: orders
    dimensions:
      - name: id
        type: integer
        primary_key: true
relationships:
  - name: orders_to_nowhere
    from_table: orders
    to_table: missing
    type: many_to_one
    join_on: orders.x = missing.x
"#;
    let err = SemanticModel::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ModelError::UnknownRelationshipTable { .. }));
}

#[test]
fn rejects_many_to_one_target_without_primary_key() {
    let yaml = r#"
tables:
  orders:
    name: orders
    dimensions:
      - name: id
        type: integer
        primary_key: true
  customers:
    name: customers
    dimensions:
      - name: region
        type: string
relationships:
  - name: orders_to_customers
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: orders.customer_id = customers.id
"#;
    let err = SemanticModel::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ModelError::MissingPrimaryKey(table) if table == "customers"));
}

#[test]
fn rejects_duplicate_member_names_on_one_table() {
    let yaml = r#"
tables:
  orders:
    name: orders
    dimensions:
      - name: id
        type: integer
        primary_key: true
    measures:
      - name: id
        type: integer
        aggregation: sum
"#;
    let err = SemanticModel::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateMember { .. }));
}
