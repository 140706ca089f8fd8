use vantage::model::SemanticModel;
use vantage::semantic::{ResolvedMember, Resolver, ResolverError};

fn model() -> SemanticModel {
    SemanticModel::from_yaml(
        r#"
tables:
  orders:
    name: orders
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: status, type: string}
    measures:
      - {name: total_revenue, type: decimal, aggregation: sum, expression: amount}
    filters:
      paid:
        condition: "status = 'paid'"
  customers:
    name: customers
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: status, type: string}
metrics:
  avg_order_value:
    expression: "orders.total_revenue / orders.order_count"
"#,
    )
    .unwrap()
}

#[test]
fn resolves_a_qualified_member_to_its_table() {
    let model = model();
    let resolver = Resolver::new(&model);
    let resolved = resolver.resolve_dimension("orders.status").unwrap();
    assert!(matches!(resolved, ResolvedMember::Dimension { table_key: "orders", .. }));
}

#[test]
fn bare_name_present_on_two_tables_is_ambiguous() {
    let model = model();
    let resolver = Resolver::new(&model);
    let err = resolver.resolve_dimension("status").unwrap_err();
    assert!(matches!(err, ResolverError::Ambiguous { .. }));
}

#[test]
fn bare_name_shared_by_both_tables_is_also_ambiguous() {
    let model = model();
    let resolver = Resolver::new(&model);
    let err = resolver.resolve_dimension("id").unwrap_err();
    assert!(matches!(err, ResolverError::Ambiguous { .. }));
}

#[test]
fn resolves_a_metric_in_its_own_namespace() {
    let model = model();
    let resolver = Resolver::new(&model);
    let resolved = resolver.resolve_metric("avg_order_value").unwrap();
    assert!(matches!(resolved, ResolvedMember::Metric { name: "avg_order_value", .. }));
}

#[test]
fn unknown_member_is_reported_as_such() {
    let model = model();
    let resolver = Resolver::new(&model);
    let err = resolver.resolve_dimension("orders.nonexistent").unwrap_err();
    assert!(matches!(err, ResolverError::UnknownMember(_)));
}

#[test]
fn resolves_a_qualified_segment() {
    let model = model();
    let resolver = Resolver::new(&model);
    let resolved = resolver.resolve_segment("orders.paid").unwrap();
    assert!(matches!(resolved, ResolvedMember::Segment { table_key: "orders", .. }));
}
