use vantage::model::SemanticModel;
use vantage::semantic::{GraphError, JoinGraph};

fn chain_model() -> SemanticModel {
    SemanticModel::from_yaml(
        r#"
tables:
  orders:
    name: orders
    dimensions:
      - {name: id, type: integer, primary_key: true}
  customers:
    name: customers
    dimensions:
      - {name: id, type: integer, primary_key: true}
  regions:
    name: regions
    dimensions:
      - {name: id, type: integer, primary_key: true}
  isolated:
    name: isolated
    dimensions:
      - {name: id, type: integer, primary_key: true}
relationships:
  - name: orders_to_customers
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: orders.customer_id = customers.id
  - name: customers_to_regions
    from_table: customers
    to_table: regions
    type: many_to_one
    join_on: customers.region_id = regions.id
"#,
    )
    .unwrap()
}

#[test]
fn shortest_path_is_empty_between_a_table_and_itself() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    assert!(graph.shortest_path("orders", "orders").unwrap().is_empty());
}

#[test]
fn shortest_path_finds_a_direct_edge() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let steps = graph.shortest_path("orders", "customers").unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].table_key, "customers");
    assert!(steps[0].forward);
}

#[test]
fn shortest_path_walks_a_multi_hop_chain() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let steps = graph.shortest_path("orders", "regions").unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].table_key, "customers");
    assert_eq!(steps[1].table_key, "regions");
}

#[test]
fn shortest_path_can_traverse_a_relationship_in_reverse() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let steps = graph.shortest_path("customers", "orders").unwrap();
    assert_eq!(steps.len(), 1);
    assert!(!steps[0].forward);
}

#[test]
fn no_path_between_disconnected_tables_is_an_error() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let err = graph.shortest_path("orders", "isolated").unwrap_err();
    assert!(matches!(err, GraphError::NoPath { .. }));
}

#[test]
fn unknown_table_is_reported_distinctly_from_no_path() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let err = graph.shortest_path("orders", "nonexistent").unwrap_err();
    assert!(matches!(err, GraphError::UnknownTable(t) if t == "nonexistent"));
}

#[test]
fn plan_reaches_every_required_table_from_the_base() {
    let model = chain_model();
    let graph = JoinGraph::new(&model);
    let plan = graph.plan("orders", &["customers", "regions"]).unwrap();
    let reached: Vec<&str> = plan.iter().map(|s| s.table_key).collect();
    assert!(reached.contains(&"customers"));
    assert!(reached.contains(&"regions"));
}
