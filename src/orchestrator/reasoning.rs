//! Reasoning Controller: deterministic rules deciding whether the
//! supervisor should iterate again, and with what context changes.

use serde::{Deserialize, Serialize};

use super::planner::{EntityResolutionState, PlanningContext, Route};
use crate::agents::research::ResearchReport;
use crate::agents::web_search::WebSearchResult;

const ENTITY_ALIAS_HINTS: &[&str] = &["store", "shop", "outlet", "client", "product", "region"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub step_id: String,
    pub arguments: serde_json::Value,
    pub result_summary: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanExecutionArtifacts {
    pub analyst_error: Option<String>,
    pub analyst_row_count: Option<usize>,
    pub question: String,
    pub clarifying_question: Option<String>,
    pub research_result: Option<ResearchReport>,
    pub web_search_result: Option<WebSearchResult>,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl PlanExecutionArtifacts {
    fn is_empty(&self) -> bool {
        self.analyst_error.is_none()
            && self.analyst_row_count.is_none()
            && self.clarifying_question.is_none()
            && self.research_result.is_none()
            && self.web_search_result.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReasoningDecision {
    pub continue_planning: bool,
    pub updated_context: Option<PlanningContext>,
    pub rationale: String,
}

fn normalize_error(error: &str) -> String {
    const MAX_LEN: usize = 240;
    let collapsed = error.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_LEN).collect()
}

/// Finds an entity-alias token followed by a proper-noun phrase, returning
/// `(entity_type, entity_phrase)`.
fn detect_entity_alias(question: &str) -> Option<(String, String)> {
    let words: Vec<&str> = question.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if ENTITY_ALIAS_HINTS.contains(&bare.as_str()) {
            if let Some(next) = words.get(i + 1) {
                let candidate = next.trim_matches(|c: char| !c.is_alphanumeric());
                if candidate.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    return Some((bare, candidate.to_string()));
                }
            }
        }
    }
    None
}

fn pluralize(word: &str) -> String {
    if word.ends_with('s') {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub struct ReasoningController {
    pub max_iterations: u32,
}

impl ReasoningController {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    pub fn decide(&self, iteration: u32, context: &PlanningContext, artifacts: &PlanExecutionArtifacts, previous_analyst_error: Option<&str>) -> ReasoningDecision {
        // Rule 1: clarifying question emitted, or iteration budget exhausted.
        if artifacts.clarifying_question.is_some() || iteration + 1 >= self.max_iterations {
            return ReasoningDecision { continue_planning: false, updated_context: None, rationale: "clarification emitted or max_iterations reached".to_string() };
        }

        // Rule 2: repeated, normalized-identical analyst error -> stop.
        if let (Some(current), Some(previous)) = (&artifacts.analyst_error, previous_analyst_error) {
            if normalize_error(current) == normalize_error(previous) {
                return ReasoningDecision { continue_planning: false, updated_context: None, rationale: "repeated analyst error, avoiding retry loop".to_string() };
            }
        }

        // Rule 3: no-rows response with a detectable entity alias; retry once via entity resolution.
        let attempts = context.reasoning.entity_resolution.as_ref().map(|e| e.attempts).unwrap_or(0);
        if artifacts.analyst_row_count == Some(0) && attempts < 1 {
            if let Some((entity_type, entity_phrase)) = detect_entity_alias(&artifacts.question) {
                let mut updated = context.clone();
                updated.reasoning.entity_resolution = Some(EntityResolutionState {
                    entity_type: entity_type.clone(),
                    entity_phrase,
                    original_question: artifacts.question.clone(),
                    probe_question: format!("List all {}", pluralize(&entity_type)),
                    attempts: attempts + 1,
                });
                return ReasoningDecision { continue_planning: true, updated_context: Some(updated), rationale: "retrying with entity resolution".to_string() };
            }
        }

        // Rule 4: analyst error with no supporting web/research data -> flip route.
        if let Some(error) = &artifacts.analyst_error {
            if artifacts.web_search_result.is_none() && artifacts.research_result.is_none() {
                let mut updated = context.clone();
                updated.routing.force_route = Some(flip_route(updated.routing.previous_route));
                return ReasoningDecision { continue_planning: true, updated_context: Some(updated), rationale: format!("retrying after analyst error: {error}") };
            }
        }

        // Rule 5: empty artifacts -> flip route and retry.
        if artifacts.is_empty() {
            let mut updated = context.clone();
            updated.routing.force_route = Some(flip_route(updated.routing.previous_route));
            return ReasoningDecision { continue_planning: true, updated_context: Some(updated), rationale: "empty artifacts, retrying with alternate route".to_string() };
        }

        // Rule 6: web search produced sources but no research synthesis -> promote to deep research.
        if let Some(web) = &artifacts.web_search_result {
            if !web.results.is_empty() && artifacts.research_result.is_none() {
                let mut updated = context.clone();
                updated.routing.force_route = Some(Route::DeepResearch);
                updated.documents = web.to_documents();
                return ReasoningDecision { continue_planning: true, updated_context: Some(updated), rationale: "web search produced sources, promoting to deep research".to_string() };
            }
        }

        // Rule 7: research produced from no sources -> flip to web search.
        if let Some(research) = &artifacts.research_result {
            let no_sources = research.key_findings.iter().all(|f| f.evidence_ids.is_empty()) || research.executive_summary.to_lowercase().contains("no documents");
            if no_sources {
                let mut updated = context.clone();
                updated.routing.force_route = Some(Route::WebSearch);
                return ReasoningDecision { continue_planning: true, updated_context: Some(updated), rationale: "research produced no sources, retrying with web search".to_string() };
            }
        }

        // Rule 8: otherwise stop.
        ReasoningDecision { continue_planning: false, updated_context: None, rationale: "artifacts satisfy the request".to_string() }
    }
}

fn flip_route(previous: Option<Route>) -> Route {
    match previous {
        Some(Route::WebSearch) => Route::DeepResearch,
        Some(Route::DeepResearch) => Route::WebSearch,
        Some(Route::SimpleAnalyst) | Some(Route::AnalystThenVisual) => Route::WebSearch,
        _ => Route::DeepResearch,
    }
}
