//! Deep research agent: iterative evidence gathering over one or more
//! subquestions, with coverage and source-diversity stop conditions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::web_search::WebSearchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    pub question: String,
    #[serde(default)]
    pub subquestions: Vec<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_target_coverage")]
    pub target_coverage: f32,
}

fn default_max_steps() -> u32 {
    4
}

fn default_target_coverage() -> f32 {
    0.75
}

impl ResearchPlan {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            subquestions: Vec::new(),
            max_steps: default_max_steps(),
            target_coverage: default_target_coverage(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub id: String,
    pub source_type: String,
    pub source: String,
    pub domain: Option<String>,
    pub snippet: String,
    pub relevance: f32,
    pub subquestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResearchState {
    pub steps_taken: u32,
    pub coverage_score: f32,
    pub source_diversity: u32,
    pub diminishing_returns_count: u32,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFinding {
    pub id: String,
    pub claim: String,
    pub evidence_ids: Vec<String>,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub question: String,
    pub executive_summary: String,
    pub key_findings: Vec<ResearchFinding>,
    pub weak_evidence: bool,
    pub follow_up_question: Option<String>,
}

impl ResearchReport {
    /// Holds when every finding's evidence references an item that was
    /// actually gathered.
    pub fn evidence_is_consistent(&self, evidence: &[EvidenceItem]) -> bool {
        let known: HashSet<&str> = evidence.iter().map(|e| e.id.as_str()).collect();
        self.key_findings
            .iter()
            .all(|f| f.evidence_ids.iter().all(|id| known.contains(id.as_str())))
    }
}

const MIN_SOURCE_DIVERSITY: u32 = 3;

pub struct DeepResearchAgent;

impl DeepResearchAgent {
    /// One research step: folds `new_evidence` (already gathered by the
    /// caller, e.g. from a web search or prior document context) into the
    /// pool, recomputes coverage/diversity, and decides whether to stop.
    pub fn step(&self, plan: &ResearchPlan, state: &mut ResearchState, evidence_pool: &mut Vec<EvidenceItem>, new_evidence: Vec<EvidenceItem>) {
        state.steps_taken += 1;
        let before = evidence_pool.len();
        for item in new_evidence {
            if !evidence_pool.iter().any(|e| e.id == item.id) {
                evidence_pool.push(item);
            }
        }
        if evidence_pool.len() == before {
            state.diminishing_returns_count += 1;
        } else {
            state.diminishing_returns_count = 0;
        }
        self.update_coverage(state, plan, evidence_pool);
        self.update_source_diversity(state, evidence_pool);
        self.maybe_stop(plan, state);
    }

    fn update_coverage(&self, state: &mut ResearchState, plan: &ResearchPlan, evidence: &[EvidenceItem]) {
        if plan.subquestions.is_empty() {
            state.coverage_score = if evidence.is_empty() { 0.0 } else { 1.0 };
            return;
        }
        let answered = plan
            .subquestions
            .iter()
            .filter(|q| evidence.iter().any(|e| e.subquestion.as_deref() == Some(q.as_str())))
            .count();
        state.coverage_score = (answered as f32 / plan.subquestions.len() as f32).clamp(0.0, 1.0);
    }

    fn update_source_diversity(&self, state: &mut ResearchState, evidence: &[EvidenceItem]) {
        let domains: HashSet<&str> = evidence.iter().filter_map(|e| e.domain.as_deref()).collect();
        state.source_diversity = domains.len() as u32;
    }

    fn maybe_stop(&self, plan: &ResearchPlan, state: &mut ResearchState) {
        if state.stop_reason.is_some() {
            return;
        }
        if state.steps_taken >= plan.max_steps {
            state.stop_reason = Some("step_budget_reached".to_string());
        } else if state.coverage_score >= plan.target_coverage && state.source_diversity >= MIN_SOURCE_DIVERSITY {
            state.stop_reason = Some("coverage_and_diversity_reached".to_string());
        } else if state.diminishing_returns_count >= 2 && state.steps_taken >= 2 {
            state.stop_reason = Some("diminishing_returns".to_string());
        }
    }

    pub fn should_continue(&self, state: &ResearchState) -> bool {
        state.stop_reason.is_none()
    }

    /// Synthesizes a report. Weak evidence (too few domains or items) is
    /// flagged rather than hidden.
    pub fn synthesize(&self, plan: &ResearchPlan, state: &ResearchState, evidence: &[EvidenceItem]) -> ResearchReport {
        let weak = state.source_diversity < MIN_SOURCE_DIVERSITY || evidence.len() < 3;
        let key_findings: Vec<ResearchFinding> = plan
            .subquestions
            .iter()
            .enumerate()
            .map(|(i, subquestion)| {
                let supporting: Vec<&EvidenceItem> = evidence.iter().filter(|e| e.subquestion.as_deref() == Some(subquestion.as_str())).collect();
                ResearchFinding {
                    id: format!("finding-{i}"),
                    claim: if supporting.is_empty() {
                        format!("No evidence found for: {subquestion}")
                    } else {
                        supporting[0].snippet.clone()
                    },
                    evidence_ids: supporting.iter().map(|e| e.id.clone()).collect(),
                    confidence: if supporting.len() >= 2 { "high" } else if supporting.is_empty() { "low" } else { "medium" }.to_string(),
                }
            })
            .collect();

        ResearchReport {
            question: plan.question.clone(),
            executive_summary: format!(
                "Reviewed {} evidence item(s) across {} source domain(s).",
                evidence.len(),
                state.source_diversity
            ),
            key_findings,
            weak_evidence: weak,
            follow_up_question: weak.then(|| format!("Could you point to a more specific source for: {}?", plan.question)),
        }
    }

    /// Promotes web search results into the evidence pool as documents,
    /// used when the reasoning controller flips a stalled research route
    /// back to web search and its results need folding back in.
    pub fn evidence_from_web_result(result: &WebSearchResult, subquestion: &str) -> Vec<EvidenceItem> {
        result
            .results
            .iter()
            .map(|item| EvidenceItem {
                id: format!("web:{}", item.url),
                source_type: "web".to_string(),
                source: item.source.clone(),
                domain: url_domain(&item.url),
                snippet: item.snippet.clone(),
                relevance: 1.0 / (item.rank.max(1) as f32),
                subquestion: Some(subquestion.to_string()),
            })
            .collect()
    }
}

fn url_domain(url: &str) -> Option<String> {
    url.split("://").nth(1)?.split('/').next().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(id: &str, domain: &str, subquestion: &str) -> EvidenceItem {
        EvidenceItem {
            id: id.to_string(),
            source_type: "web".into(),
            source: domain.to_string(),
            domain: Some(domain.to_string()),
            snippet: format!("snippet for {id}"),
            relevance: 0.9,
            subquestion: Some(subquestion.to_string()),
        }
    }

    #[test]
    fn test_stops_when_coverage_and_diversity_reached() {
        let agent = DeepResearchAgent;
        let plan = ResearchPlan { question: "q".into(), subquestions: vec!["a".into()], max_steps: 4, target_coverage: 0.5 };
        let mut state = ResearchState::default();
        let mut pool = Vec::new();
        agent.step(&plan, &mut state, &mut pool, vec![evidence("e1", "d1.com", "a"), evidence("e2", "d2.com", "a"), evidence("e3", "d3.com", "a")]);
        assert_eq!(state.stop_reason.as_deref(), Some("coverage_and_diversity_reached"));
        assert!(!agent.should_continue(&state));
    }

    #[test]
    fn test_stops_on_diminishing_returns() {
        let agent = DeepResearchAgent;
        let plan = ResearchPlan { question: "q".into(), subquestions: vec!["a".into(), "b".into()], max_steps: 10, target_coverage: 0.99 };
        let mut state = ResearchState::default();
        let mut pool = vec![evidence("e1", "d1.com", "a")];
        agent.step(&plan, &mut state, &mut pool, vec![evidence("e1", "d1.com", "a")]);
        agent.step(&plan, &mut state, &mut pool, vec![evidence("e1", "d1.com", "a")]);
        assert_eq!(state.stop_reason.as_deref(), Some("diminishing_returns"));
    }

    #[test]
    fn test_report_evidence_consistency_invariant() {
        let agent = DeepResearchAgent;
        let plan = ResearchPlan { question: "q".into(), subquestions: vec!["a".into()], max_steps: 4, target_coverage: 0.5 };
        let state = ResearchState::default();
        let pool = vec![evidence("e1", "d1.com", "a")];
        let report = agent.synthesize(&plan, &state, &pool);
        assert!(report.evidence_is_consistent(&pool));
    }
}
