use std::collections::HashMap;
use std::sync::Arc;

use vantage::agents::analyst::AnalystTool;
use vantage::capability::completer::StubCompleter;
use vantage::capability::sql_connector::{ExecuteResult, InMemorySqlConnector};
use vantage::model::SemanticModel;
use vantage::orchestrator::{PlanningConstraints, Supervisor};
use vantage::sql::dialect::Dialect;

fn constraints() -> PlanningConstraints {
    PlanningConstraints {
        max_steps: 4,
        prefer_low_latency: false,
        require_viz_when_chartable: false,
        allow_sql_analyst: true,
        allow_web_search: true,
        allow_deep_research: true,
        timebox_seconds: None,
        cost_sensitivity: 0.0,
    }
}

fn empty_model() -> SemanticModel {
    SemanticModel {
        name: None,
        tables: HashMap::new(),
        relationships: Vec::new(),
        metrics: HashMap::new(),
        dialect: None,
        tags: Vec::new(),
        description: None,
    }
}

#[tokio::test]
async fn an_ambiguous_question_stops_after_one_iteration_with_a_clarifying_summary() {
    let analyst = Arc::new(AnalystTool::new(
        Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")),
        Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
        empty_model(),
        "test_model",
    ));
    let supervisor = Supervisor::new(analyst, 3);
    let result = supervisor.run("update me", constraints(), || 0).await;
    assert!(result.summary.to_lowercase().contains("clarify"));
    assert_eq!(result.tool_calls.len(), 1);
}

#[tokio::test]
async fn a_succeeding_query_records_a_tool_call_and_a_result_value() {
    let fixture = ExecuteResult { columns: vec!["n".into()], rows: vec![vec![1.into()]], rowcount: Some(1), elapsed_ms: Some(1), sql: "SELECT 1".into() };
    let connector = InMemorySqlConnector::new(Dialect::Postgres).with_fixture("SELECT 1", fixture);
    let analyst = Arc::new(AnalystTool::new(Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")), Arc::new(connector), empty_model(), "test_model"));
    let supervisor = Supervisor::new(analyst, 3);
    let result = supervisor.run("how many customers do we have", constraints(), || 0).await;
    assert!(!result.tool_calls.is_empty());
    assert!(result.result.is_some());
    assert_eq!(result.summary, "Query completed successfully.");
}

#[tokio::test]
async fn a_failing_query_is_summarized_as_incomplete_rather_than_panicking() {
    let analyst = Arc::new(AnalystTool::new(
        Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")),
        Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
        empty_model(),
        "test_model",
    ));
    let supervisor = Supervisor::new(analyst, 2);
    let result = supervisor.run("how many customers do we have", constraints(), || 0).await;
    assert!(result.summary.starts_with("The query could not be completed"));
}

#[tokio::test]
async fn the_loop_never_exceeds_the_configured_max_iterations() {
    let analyst = Arc::new(AnalystTool::new(
        Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")),
        Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
        empty_model(),
        "test_model",
    ));
    let supervisor = Supervisor::new(analyst, 2);
    let result = supervisor.run("how many customers do we have", constraints(), || 0).await;
    // Each iteration records a rationale plus a decision rationale; bound
    // generously so an accidental infinite loop still fails the test.
    assert!(result.diagnostics.len() <= 8);
}

#[tokio::test]
async fn diagnostics_are_never_empty_after_a_run() {
    let analyst = Arc::new(AnalystTool::new(
        Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")),
        Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
        empty_model(),
        "test_model",
    ));
    let supervisor = Supervisor::new(analyst, 3);
    let result = supervisor.run("update me", constraints(), || 0).await;
    assert!(!result.diagnostics.is_empty());
}
