//! Planner / Router: scores candidate routes from question signals and
//! context overrides, then expands the winning route into an ordered
//! [`Plan`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    SimpleAnalyst,
    AnalystThenVisual,
    WebSearch,
    DeepResearch,
    Clarify,
}

impl Route {
    /// Tie-break priority: lower sorts first.
    fn priority(self) -> u8 {
        match self {
            Route::SimpleAnalyst => 0,
            Route::AnalystThenVisual => 1,
            Route::WebSearch => 2,
            Route::DeepResearch => 3,
            Route::Clarify => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAgent {
    Analyst,
    Visual,
    WebSearch,
    DocRetrieval,
    Clarify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub id: String,
    pub agent: PlanAgent,
    pub input: serde_json::Value,
    pub expected_output: String,
    #[serde(default)]
    pub source_step_ref: Option<String>,
    #[serde(default)]
    pub rows_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub route: Route,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningConstraints {
    pub max_steps: u32,
    #[serde(default)]
    pub prefer_low_latency: bool,
    #[serde(default)]
    pub require_viz_when_chartable: bool,
    #[serde(default = "default_true")]
    pub allow_sql_analyst: bool,
    #[serde(default = "default_true")]
    pub allow_web_search: bool,
    #[serde(default = "default_true")]
    pub allow_deep_research: bool,
    pub timebox_seconds: Option<u32>,
    #[serde(default)]
    pub cost_sensitivity: f32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingOverrides {
    pub force_route: Option<Route>,
    #[serde(default)]
    pub prefer_routes: Vec<Route>,
    #[serde(default)]
    pub avoid_routes: Vec<Route>,
    pub require_web_search: bool,
    pub require_visual: bool,
    pub require_deep_research: bool,
    pub require_sql: bool,
    pub previous_route: Option<Route>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningContext {
    #[serde(default)]
    pub routing: RoutingOverrides,
    #[serde(default)]
    pub reasoning: ReasoningContext,
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningContext {
    pub entity_resolution: Option<EntityResolutionState>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResolutionState {
    pub entity_type: String,
    pub entity_phrase: String,
    pub original_question: String,
    pub probe_question: String,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct PlannerRequest {
    pub question: String,
    pub context: PlanningContext,
    pub constraints: PlanningConstraints,
}

#[derive(Debug, Clone, Default)]
struct Signals {
    sql_signals: bool,
    visual_cues: bool,
    research_signals: bool,
    web_signals: bool,
    has_entity_reference: bool,
    has_time_reference: bool,
    chartable: bool,
}

const SQL_KEYWORDS: &[&str] = &["show", "list", "count", "top", "avg", "average", "sum", "over time", "how many", "compare"];
const VISUAL_KEYWORDS: &[&str] = &["chart", "plot", "dashboard", "graph", "visualize", "visualise"];
const RESEARCH_KEYWORDS: &[&str] = &["summarize", "summarise", "whitepaper", "report", "research", "deep dive"];
const WEB_KEYWORDS: &[&str] = &["web", "internet", "google", "news", "online"];
const TIME_KEYWORDS: &[&str] = &["today", "yesterday", "week", "month", "quarter", "year", "trend", "over time"];
const ENTITY_HINTS: &[&str] = &["store", "shop", "outlet", "client", "product", "region", "customer", "vendor"];
const AMBIGUOUS_PHRASES: &[&str] = &["show me performance", "update me", "what's going on", "how are we doing"];

fn extract_signals(question: &str) -> Signals {
    let lower = question.to_lowercase();
    let sql_signals = SQL_KEYWORDS.iter().any(|k| lower.contains(k));
    let visual_cues = VISUAL_KEYWORDS.iter().any(|k| lower.contains(k));
    let research_signals = RESEARCH_KEYWORDS.iter().any(|k| lower.contains(k));
    let web_signals = WEB_KEYWORDS.iter().any(|k| lower.contains(k));
    let has_time_reference = TIME_KEYWORDS.iter().any(|k| lower.contains(k));
    let has_entity_reference = ENTITY_HINTS.iter().any(|k| lower.contains(k))
        || question.split_whitespace().any(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false));
    let chartable = visual_cues || (sql_signals && has_time_reference);
    Signals {
        sql_signals,
        visual_cues,
        research_signals,
        web_signals,
        has_entity_reference,
        has_time_reference,
        chartable,
    }
}

fn needs_clarification(question: &str, signals: &Signals) -> bool {
    let lower = question.to_lowercase();
    if AMBIGUOUS_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    let token_count = question.split_whitespace().count();
    if token_count <= 4 && !question.contains('?') && !signals.research_signals && !signals.web_signals {
        return true;
    }
    if lower.contains("performance") && !signals.has_entity_reference && !signals.research_signals && !signals.web_signals {
        return true;
    }
    false
}

fn score_routes(signals: &Signals, constraints: &PlanningConstraints) -> HashMap<Route, f32> {
    let mut scores = HashMap::new();

    if constraints.allow_sql_analyst {
        let mut simple = 0.0;
        if signals.sql_signals {
            simple += 3.0;
        }
        if signals.has_entity_reference {
            simple += 1.0;
        }
        if signals.has_time_reference {
            simple += 1.0;
        }
        if signals.chartable {
            simple += 0.5;
        }
        if signals.research_signals {
            simple -= 1.5;
        }
        scores.insert(Route::SimpleAnalyst, simple);

        let mut analyst_then_visual = simple;
        if signals.chartable {
            analyst_then_visual += 2.0;
        }
        if signals.visual_cues {
            analyst_then_visual += 1.5;
        }
        scores.insert(Route::AnalystThenVisual, analyst_then_visual);
    }

    if constraints.allow_web_search && signals.web_signals {
        let mut web = 3.0;
        if signals.research_signals {
            web += 1.0;
        }
        if signals.sql_signals {
            web -= 2.0;
        }
        if constraints.prefer_low_latency {
            web += 0.5;
        }
        scores.insert(Route::WebSearch, web);
    }

    if constraints.allow_deep_research {
        let mut deep = if signals.research_signals {
            3.5
        } else if signals.web_signals {
            1.2
        } else {
            -1.25
        };
        if !signals.sql_signals {
            deep += 1.0;
        }
        if signals.sql_signals && (signals.research_signals || signals.web_signals) {
            deep += 0.5;
        }
        if constraints.prefer_low_latency {
            deep -= 2.0;
        }
        deep += if constraints.cost_sensitivity > 0.5 { -1.0 } else { 1.0 };
        scores.insert(Route::DeepResearch, deep);
    }

    scores
}

fn apply_overrides(scores: &mut HashMap<Route, f32>, overrides: &RoutingOverrides) {
    for route in &overrides.prefer_routes {
        *scores.entry(*route).or_insert(0.0) += 1.5;
    }
    for route in &overrides.avoid_routes {
        scores.insert(*route, f32::NEG_INFINITY);
    }
    if overrides.require_web_search {
        *scores.entry(Route::WebSearch).or_insert(0.0) += 2.0;
    }
    if overrides.require_visual {
        *scores.entry(Route::AnalystThenVisual).or_insert(0.0) += 2.0;
    }
    if overrides.require_deep_research {
        *scores.entry(Route::DeepResearch).or_insert(0.0) += 2.5;
    }
    if overrides.require_sql {
        *scores.entry(Route::SimpleAnalyst).or_insert(0.0) += 2.0;
    }
    if let Some(previous) = overrides.previous_route {
        if let Some(score) = scores.get_mut(&previous) {
            *score -= 1.0;
        }
    }
}

fn pick_route(scores: &HashMap<Route, f32>) -> Route {
    scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal).then(b.0.priority().cmp(&a.0.priority())))
        .map(|(route, _)| *route)
        .unwrap_or(Route::Clarify)
}

fn infer_user_intent(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    if lower.contains("trend") || lower.contains("over time") {
        "time_series_comparison"
    } else if lower.contains(" vs") || lower.contains("versus") || lower.contains("compare") {
        "comparative_view"
    } else if lower.contains("top") || lower.contains("rank") {
        "ranked_highlights"
    } else if lower.contains("distribution") || lower.contains("histogram") {
        "distribution_analysis"
    } else {
        "insight_visualization"
    }
}

fn pluralize(word: &str) -> String {
    if word.ends_with('s') {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub struct Planner;

impl Planner {
    pub fn plan(&self, request: &PlannerRequest) -> Plan {
        let signals = extract_signals(&request.question);

        if let Some(forced) = request.context.routing.force_route {
            return self.build_plan(forced, &request.question, &request.context, &request.constraints, &signals, "forced by context.routing.force_route".to_string());
        }

        if needs_clarification(&request.question, &signals) {
            return self.build_plan(Route::Clarify, &request.question, &request.context, &request.constraints, &signals, "question is ambiguous or underspecified".to_string());
        }

        if request.constraints.require_viz_when_chartable && signals.chartable && request.constraints.allow_sql_analyst && request.constraints.max_steps >= 2 {
            return self.build_plan(Route::AnalystThenVisual, &request.question, &request.context, &request.constraints, &signals, "chartable question with visualization required".to_string());
        }

        let mut scores = score_routes(&signals, &request.constraints);
        apply_overrides(&mut scores, &request.context.routing);
        let route = pick_route(&scores);
        self.build_plan(route, &request.question, &request.context, &request.constraints, &signals, format!("scored route {route:?}"))
    }

    fn build_plan(&self, route: Route, question: &str, context: &PlanningContext, constraints: &PlanningConstraints, signals: &Signals, rationale: String) -> Plan {
        let steps = match route {
            Route::SimpleAnalyst => self.simple_analyst_steps(question, context),
            Route::AnalystThenVisual => self.analyst_then_visual_steps(question, context),
            Route::WebSearch => self.web_search_steps(question, constraints),
            Route::DeepResearch => self.deep_research_steps(question, context, constraints, signals),
            Route::Clarify => self.clarify_steps(question, signals),
        };
        Plan { steps, route, rationale }
    }

    fn simple_analyst_steps(&self, question: &str, context: &PlanningContext) -> Vec<PlanStep> {
        if let Some(resolution) = &context.reasoning.entity_resolution {
            let probe = PlanStep {
                id: "step-0".to_string(),
                agent: PlanAgent::Analyst,
                input: serde_json::json!({"question": resolution.probe_question}),
                expected_output: "entity candidate rows".to_string(),
                source_step_ref: None,
                rows_ref: None,
            };
            let rewritten = PlanStep {
                id: "step-1".to_string(),
                agent: PlanAgent::Analyst,
                input: serde_json::json!({"question": resolution.original_question, "follow_up": resolution.probe_question}),
                expected_output: "answer rows".to_string(),
                source_step_ref: Some("step-0".to_string()),
                rows_ref: None,
            };
            return vec![probe, rewritten];
        }
        vec![PlanStep {
            id: "step-0".to_string(),
            agent: PlanAgent::Analyst,
            input: serde_json::json!({"question": question}),
            expected_output: "answer rows".to_string(),
            source_step_ref: None,
            rows_ref: None,
        }]
    }

    fn analyst_then_visual_steps(&self, question: &str, context: &PlanningContext) -> Vec<PlanStep> {
        let mut steps = self.simple_analyst_steps(question, context);
        let analyst_id = steps.last().expect("simple_analyst_steps never returns empty").id.clone();
        steps.push(PlanStep {
            id: format!("step-{}", steps.len()),
            agent: PlanAgent::Visual,
            input: serde_json::json!({"question": question, "user_intent": infer_user_intent(question)}),
            expected_output: "chart specification".to_string(),
            source_step_ref: None,
            rows_ref: Some(analyst_id),
        });
        steps
    }

    fn web_search_steps(&self, question: &str, constraints: &PlanningConstraints) -> Vec<PlanStep> {
        vec![PlanStep {
            id: "step-0".to_string(),
            agent: PlanAgent::WebSearch,
            input: serde_json::json!({
                "query": question,
                "max_results": 6,
                "region": serde_json::Value::Null,
                "safe_search": "moderate",
                "timebox_seconds": constraints.timebox_seconds.unwrap_or(20),
            }),
            expected_output: "web search results".to_string(),
            source_step_ref: None,
            rows_ref: None,
        }]
    }

    fn deep_research_steps(&self, question: &str, context: &PlanningContext, constraints: &PlanningConstraints, signals: &Signals) -> Vec<PlanStep> {
        let mut steps = Vec::new();
        let needs_web_precursor = context.routing.require_web_search && context.documents.is_empty();
        if needs_web_precursor {
            steps.push(PlanStep {
                id: format!("step-{}", steps.len()),
                agent: PlanAgent::WebSearch,
                input: serde_json::json!({"query": question, "max_results": 6}),
                expected_output: "web search results".to_string(),
                source_step_ref: None,
                rows_ref: None,
            });
        }
        let doc_retrieval_id = format!("step-{}", steps.len());
        steps.push(PlanStep {
            id: doc_retrieval_id.clone(),
            agent: PlanAgent::DocRetrieval,
            input: serde_json::json!({"question": question}),
            expected_output: "retrieved documents".to_string(),
            source_step_ref: steps.last().map(|s: &PlanStep| s.id.clone()),
            rows_ref: None,
        });
        if signals.sql_signals && (steps.len() as u32) < constraints.max_steps {
            steps.push(PlanStep {
                id: format!("step-{}", steps.len()),
                agent: PlanAgent::Analyst,
                input: serde_json::json!({"question": question}),
                expected_output: "validating analyst rows".to_string(),
                source_step_ref: Some(doc_retrieval_id),
                rows_ref: None,
            });
        }
        if signals.chartable && constraints.require_viz_when_chartable && (steps.len() as u32) < constraints.max_steps {
            let last_id = steps.last().expect("at least doc retrieval step present").id.clone();
            steps.push(PlanStep {
                id: format!("step-{}", steps.len()),
                agent: PlanAgent::Visual,
                input: serde_json::json!({"question": question, "user_intent": infer_user_intent(question)}),
                expected_output: "chart specification".to_string(),
                source_step_ref: None,
                rows_ref: Some(last_id),
            });
        }
        steps
    }

    fn clarify_steps(&self, question: &str, signals: &Signals) -> Vec<PlanStep> {
        let mut missing = Vec::new();
        if !signals.has_entity_reference {
            missing.push("which entity (store, product, region, ...)");
        }
        if !signals.has_time_reference {
            missing.push("which time period");
        }
        let generated = if missing.is_empty() {
            format!("Could you clarify what you mean by \"{question}\"?")
        } else {
            format!("To answer \"{question}\", could you clarify {}?", missing.join(" and "))
        };
        vec![PlanStep {
            id: "step-0".to_string(),
            agent: PlanAgent::Clarify,
            input: serde_json::json!({"question": generated}),
            expected_output: "clarifying question".to_string(),
            source_step_ref: None,
            rows_ref: None,
        }]
    }
}
