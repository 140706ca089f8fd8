use vantage::model::{Granularity, SemanticModel};
use vantage::query::{FilterItem, FilterOperator, Order, OrderDirection, SemanticQuery, TimeDimension};
use vantage::sql::dialect::Dialect;
use vantage::translate::{compile, TranslateError};

fn model() -> SemanticModel {
    SemanticModel::from_yaml(
        r#"
tables:
  orders:
    name: orders
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: created_at, type: timestamp}
    measures:
      - {name: total_revenue, type: decimal, aggregation: sum, expression: amount}
      - {name: order_count, type: integer, aggregation: count}
  customers:
    name: customers
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: region, type: string}
relationships:
  - name: orders_to_customers
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: "orders.customer_id = customers.id"
metrics:
  avg_order_value:
    expression: "orders.total_revenue / orders.order_count"
"#,
    )
    .unwrap()
}

#[test]
fn compiles_a_measure_grouped_by_a_joined_dimension() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        dimensions: vec!["customers.region".into()],
        ..Default::default()
    };
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains(r#"SUM(t0."amount")"#));
    assert!(sql.contains("GROUP BY"));
    assert!(sql.to_uppercase().contains("JOIN"));
}

#[test]
fn emits_dialect_qualified_sql_for_each_dialect() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        limit: Some(10),
        ..Default::default()
    };
    for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite, Dialect::TSql, Dialect::Trino, Dialect::Snowflake, Dialect::BigQuery] {
        let sql = compile(&model, &query, dialect).unwrap();
        assert!(!sql.is_empty(), "{dialect:?} produced empty sql");
    }
}

#[test]
fn resolves_a_metric_by_expanding_its_expression() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["avg_order_value".into()],
        ..Default::default()
    };
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains("avg_order_value"));
}

#[test]
fn time_dimension_truncates_to_the_requested_granularity() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        time_dimensions: vec![TimeDimension {
            dimension: "orders.created_at".into(),
            granularity: Some(Granularity::Day),
            date_range: None,
        }],
        ..Default::default()
    };
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains("DATE_TRUNC"));
}

#[test]
fn a_dimension_filter_compiles_to_where_and_a_measure_filter_to_having() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        dimensions: vec!["customers.region".into()],
        filters: vec![
            FilterItem { member: "customers.region".into(), operator: FilterOperator::Equals, values: vec!["west".into()] },
            FilterItem { member: "orders.total_revenue".into(), operator: FilterOperator::Gt, values: vec!["1000".into()] },
        ],
        ..Default::default()
    };
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains("WHERE"));
    assert!(sql.contains("HAVING"));
}

#[test]
fn order_by_references_an_output_alias() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        dimensions: vec!["customers.region".into()],
        order: vec![Order { member: "customers.region".into(), direction: OrderDirection::Desc }],
        ..Default::default()
    };
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.to_uppercase().contains("ORDER BY"));
}

#[test]
fn an_empty_query_is_rejected_before_any_resolution() {
    let model = model();
    let query = SemanticQuery::default();
    assert!(matches!(compile(&model, &query, Dialect::Postgres), Err(TranslateError::Empty)));
}

#[test]
fn an_unknown_order_member_is_reported() {
    let model = model();
    let query = SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        order: vec![Order { member: "nonexistent".into(), direction: OrderDirection::Asc }],
        ..Default::default()
    };
    assert!(compile(&model, &query, Dialect::Postgres).is_err());
}
