//! Supervisor Orchestrator: drives the plan/dispatch/reason loop for one
//! request, owning step outputs for the request's duration.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::analyst::{AnalystQueryRequest, AnalystQueryResponse, AnalystTool};
use crate::agents::research::ResearchReport;
use crate::agents::web_search::WebSearchResult;

use super::planner::{PlanAgent, PlanStep, Planner, PlannerRequest, PlanningConstraints, PlanningContext, Route};
use super::reasoning::{PlanExecutionArtifacts, ReasoningController, ToolCallRecord};

const TOOL_CONTEXT_TRIM_CHARS: usize = 360;
const MAX_SAMPLE_VALUES_PER_COLUMN: usize = 4;
const MAX_SUMMARY_ITEMS: usize = 3;

/// One step's recorded output, keyed into the request-scoped DAG by
/// `step.id`. Exclusively owned by the supervisor for the request.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub analyst_result: Option<AnalystQueryResponse>,
    pub research_result: Option<ResearchReport>,
    pub web_search_result: Option<WebSearchResult>,
    pub clarifying_question: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorResult {
    pub result: Option<serde_json::Value>,
    pub visualization: Option<serde_json::Value>,
    pub summary: String,
    pub diagnostics: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

pub struct Supervisor {
    pub planner: Planner,
    pub reasoning: ReasoningController,
    pub analyst: Arc<AnalystTool>,
}

impl Supervisor {
    pub fn new(analyst: Arc<AnalystTool>, max_iterations: u32) -> Self {
        Self { planner: Planner, reasoning: ReasoningController::new(max_iterations), analyst }
    }

    pub async fn run(&self, question: &str, constraints: PlanningConstraints, now_ms: impl Fn() -> u64 + Copy) -> SupervisorResult {
        let mut context = PlanningContext::default();
        let mut tool_calls = Vec::new();
        let mut diagnostics = Vec::new();
        let mut previous_analyst_error: Option<String> = None;
        let mut last_step_outputs: HashMap<String, StepOutput> = HashMap::new();
        let mut last_plan: Option<super::planner::Plan> = None;

        let max_iterations = self.reasoning.max_iterations;
        for iteration in 0..max_iterations {
            let plan = self.planner.plan(&PlannerRequest { question: question.to_string(), context: context.clone(), constraints: constraints.clone() });
            diagnostics.push(plan.rationale.clone());

            let mut step_outputs: HashMap<String, StepOutput> = HashMap::new();
            let mut artifacts = PlanExecutionArtifacts { question: question.to_string(), ..Default::default() };

            for step in &plan.steps {
                let started = now_ms();
                let output = self.dispatch(step, &step_outputs, &context, now_ms).await;
                let duration_ms = now_ms().saturating_sub(started);

                let (result_summary, error) = summarize_step(&output);
                tool_calls.push(ToolCallRecord {
                    step_id: step.id.clone(),
                    arguments: step.input.clone(),
                    result_summary,
                    duration_ms,
                    error: error.clone(),
                });

                merge_into_artifacts(&mut artifacts, &output);
                let is_clarify = step.agent == PlanAgent::Clarify;
                step_outputs.insert(step.id.clone(), output);
                if is_clarify {
                    break;
                }
            }

            artifacts.tool_calls = tool_calls.clone();
            last_step_outputs = step_outputs;

            let decision = self.reasoning.decide(iteration, &context, &artifacts, previous_analyst_error.as_deref());
            previous_analyst_error = artifacts.analyst_error.clone();
            last_plan = Some(plan);

            if !decision.continue_planning {
                diagnostics.push(decision.rationale);
                break;
            }
            diagnostics.push(decision.rationale);
            if let Some(updated) = decision.updated_context {
                context = updated;
            }
        }

        self.finalize(last_plan, last_step_outputs, diagnostics, tool_calls)
    }

    async fn dispatch(&self, step: &PlanStep, step_outputs: &HashMap<String, StepOutput>, context: &PlanningContext, now_ms: impl Fn() -> u64) -> StepOutput {
        match step.agent {
            PlanAgent::Analyst => {
                let tool_context = step.source_step_ref.as_ref().and_then(|id| step_outputs.get(id)).map(|prior| build_tool_context(prior));
                let mut question = step.input.get("question").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                if let Some(context_str) = tool_context {
                    question = format!("{question}\n\nContext: {context_str}");
                }
                if let Some(follow_up) = step.input.get("follow_up").and_then(|v| v.as_str()) {
                    question = format!("{question}\n\nFollow-up: {follow_up}");
                }
                let response = self.analyst.run(AnalystQueryRequest { question, filters: Vec::new(), limit: None, conversation_context: None }, now_ms).await;
                StepOutput { analyst_result: Some(response), ..Default::default() }
            }
            PlanAgent::Visual => StepOutput { ..Default::default() },
            PlanAgent::WebSearch | PlanAgent::DocRetrieval => {
                let _ = context;
                StepOutput { ..Default::default() }
            }
            PlanAgent::Clarify => {
                let question = step.input.get("question").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                StepOutput { clarifying_question: Some(question), ..Default::default() }
            }
        }
    }

    fn finalize(&self, plan: Option<super::planner::Plan>, step_outputs: HashMap<String, StepOutput>, diagnostics: Vec<String>, tool_calls: Vec<ToolCallRecord>) -> SupervisorResult {
        let Some(plan) = plan else {
            return SupervisorResult { summary: "no plan was produced".to_string(), diagnostics, tool_calls, ..Default::default() };
        };
        let last_step = plan.steps.last();
        let last_output = last_step.and_then(|s| step_outputs.get(&s.id));

        if let Some(question) = last_output.and_then(|o| o.clarifying_question.clone()) {
            return SupervisorResult { summary: question, diagnostics, tool_calls, ..Default::default() };
        }

        let result = last_output
            .and_then(|o| o.analyst_result.as_ref())
            .and_then(|r| r.result.as_ref())
            .map(|r| serde_json::to_value(r).unwrap_or(serde_json::Value::Null));

        let summary = match last_output.and_then(|o| o.analyst_result.as_ref()) {
            Some(analyst) if analyst.error.is_some() => format!("The query could not be completed: {}", analyst.error.as_deref().unwrap_or_default()),
            Some(_) => "Query completed successfully.".to_string(),
            None => match last_output.and_then(|o| o.research_result.as_ref()) {
                Some(report) => report.executive_summary.clone(),
                None => "No result was produced for this request.".to_string(),
            },
        };

        SupervisorResult { result, visualization: None, summary, diagnostics, tool_calls }
    }
}

fn merge_into_artifacts(artifacts: &mut PlanExecutionArtifacts, output: &StepOutput) {
    if let Some(analyst) = &output.analyst_result {
        artifacts.analyst_error = analyst.error.clone();
        artifacts.analyst_row_count = analyst.result.as_ref().map(|r| r.rows.len());
    }
    if output.research_result.is_some() {
        artifacts.research_result = output.research_result.clone();
    }
    if output.web_search_result.is_some() {
        artifacts.web_search_result = output.web_search_result.clone();
    }
    if output.clarifying_question.is_some() {
        artifacts.clarifying_question = output.clarifying_question.clone();
    }
}

fn summarize_step(output: &StepOutput) -> (String, Option<String>) {
    if let Some(analyst) = &output.analyst_result {
        if let Some(error) = &analyst.error {
            return (format!("analyst error: {error}"), Some(error.clone()));
        }
        let rows = analyst.result.as_ref().map(|r| r.rows.len()).unwrap_or(0);
        return (format!("analyst returned {rows} row(s)"), None);
    }
    if let Some(question) = &output.clarifying_question {
        return (format!("clarify: {question}"), None);
    }
    ("no output".to_string(), None)
}

/// Builds the "tool context" string threaded from an upstream step into a
/// dependent Analyst step: trimmed research synthesis, top findings/
/// sources, and a handful of sample values per referenced column.
fn build_tool_context(prior: &StepOutput) -> String {
    let mut parts = Vec::new();
    if let Some(research) = &prior.research_result {
        let trimmed: String = research.executive_summary.chars().take(TOOL_CONTEXT_TRIM_CHARS).collect();
        parts.push(format!("Research synthesis: {trimmed}"));
        let findings: Vec<String> = research.key_findings.iter().take(MAX_SUMMARY_ITEMS).map(|f| f.claim.clone()).collect();
        if !findings.is_empty() {
            parts.push(format!("Top findings: {}", findings.join("; ")));
        }
    }
    if let Some(web) = &prior.web_search_result {
        let sources: Vec<String> = web.results.iter().take(MAX_SUMMARY_ITEMS).map(|r| r.url.clone()).collect();
        if !sources.is_empty() {
            parts.push(format!("Top sources: {}", sources.join(", ")));
        }
    }
    if let Some(analyst) = &prior.analyst_result {
        if let Some(result) = &analyst.result {
            for (i, column) in result.columns.iter().enumerate() {
                let samples: Vec<String> = result.rows.iter().take(MAX_SAMPLE_VALUES_PER_COLUMN).map(|row| row.get(i).map(|v| v.to_string()).unwrap_or_default()).collect();
                if !samples.is_empty() {
                    parts.push(format!("{column} samples: {}", samples.join(", ")));
                }
            }
        }
    }
    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::completer::StubCompleter;
    use crate::capability::sql_connector::{ExecuteResult, InMemorySqlConnector};
    use crate::model::SemanticModel;
    use crate::sql::dialect::Dialect;

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
    async fn test_run_stops_at_clarify_and_summarizes_question() {
        let analyst = Arc::new(AnalystTool::new(
            Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")),
            Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
            empty_model(),
            "test_model",
        ));
        let supervisor = Supervisor::new(analyst, 3);
        let result = supervisor.run("update me", constraints(), || 0).await;
        assert!(result.summary.to_lowercase().contains("clarify") || result.summary.contains('?'));
    }

    #[tokio::test]
    async fn test_run_completes_simple_analyst_and_merges_result() {
        let fixture = ExecuteResult { columns: vec!["n".into()], rows: vec![vec![1.into()]], rowcount: Some(1), elapsed_ms: Some(1), sql: "SELECT 1".into() };
        let connector = InMemorySqlConnector::new(Dialect::Postgres).with_fixture("SELECT 1", fixture);
        let analyst = Arc::new(AnalystTool::new(Arc::new(StubCompleter::new("```sql\nSELECT 1\n```")), Arc::new(connector), empty_model(), "test_model"));
        let supervisor = Supervisor::new(analyst, 3);
        let result = supervisor.run("how many customers do we have", constraints(), || 0).await;
        assert!(!result.tool_calls.is_empty());
    }
}
