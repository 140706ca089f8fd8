use vantage::model::SemanticModel;
use vantage::query::{DateRange, SemanticQuery, TimeDimension};
use vantage::sql::dialect::Dialect;
use vantage::translate::compile;

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
"#,
    )
    .unwrap()
}

fn query_with_range(range: DateRange) -> SemanticQuery {
    SemanticQuery {
        measures: vec!["orders.total_revenue".into()],
        time_dimensions: vec![TimeDimension {
            dimension: "orders.created_at".into(),
            granularity: None,
            date_range: Some(range),
        }],
        ..Default::default()
    }
}

#[test]
fn absolute_range_parses_from_a_two_element_array() {
    let json = r#""2024-01-01""#;
    let dr: DateRange = serde_json::from_str(json).unwrap();
    assert_eq!(dr, DateRange::Preset("2024-01-01".to_string()));
}

#[test]
fn absolute_range_compiles_to_an_inclusive_bound() {
    let model = model();
    let query = query_with_range(DateRange::Absolute { start: "2024-01-01".into(), end: "2024-01-31".into() });
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains("2024-01-01"));
    assert!(sql.contains("2024-01-31"));
    assert!(sql.contains("<="));
}

#[test]
fn before_operator_compiles_to_a_strict_less_than() {
    let model = model();
    let query = query_with_range(DateRange::parse_str("before:2024-06-01"));
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains('<'));
    assert!(sql.contains("2024-06-01"));
}

#[test]
fn on_operator_widens_a_temporal_column_to_a_one_day_window() {
    let model = model();
    let query = query_with_range(DateRange::parse_str("on:2024-06-01"));
    let sql = compile(&model, &query, Dialect::Postgres).unwrap();
    assert!(sql.contains(">="));
    assert!(sql.contains('<'));
}

#[test]
fn named_presets_compile_without_error_across_dialects() {
    let model = model();
    for preset in ["today", "yesterday", "last_7_days", "month_to_date", "year_to_date"] {
        let query = query_with_range(DateRange::Preset(preset.to_string()));
        for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite, Dialect::TSql] {
            let sql = compile(&model, &query, dialect);
            assert!(sql.is_ok(), "preset {preset} failed to compile for {dialect:?}: {sql:?}");
        }
    }
}
