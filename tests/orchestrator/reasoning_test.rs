use vantage::agents::research::{ResearchFinding, ResearchReport};
use vantage::agents::web_search::{WebSearchResult, WebSearchResultItem};
use vantage::orchestrator::planner::{PlanningContext, Route};
use vantage::orchestrator::reasoning::{PlanExecutionArtifacts, ReasoningController};

fn web_result_with_sources() -> WebSearchResult {
    WebSearchResult {
        query: "q".to_string(),
        provider: "stub".to_string(),
        results: vec![WebSearchResultItem {
            title: "A competitor overview".to_string(),
            url: "https://example.com/a".to_string(),
            snippet: "some snippet".to_string(),
            source: "example.com".to_string(),
            rank: 1,
        }],
        warnings: Vec::new(),
        answer: None,
        citations: Vec::new(),
        weak_results: false,
        follow_up_question: None,
    }
}

fn research_report_with_no_sources() -> ResearchReport {
    ResearchReport {
        question: "q".to_string(),
        executive_summary: "no documents were available to answer this question".to_string(),
        key_findings: vec![ResearchFinding {
            id: "f1".to_string(),
            claim: "unsupported claim".to_string(),
            evidence_ids: Vec::new(),
            confidence: "low".to_string(),
        }],
        weak_evidence: true,
        follow_up_question: None,
    }
}

fn research_report_with_sources() -> ResearchReport {
    ResearchReport {
        question: "q".to_string(),
        executive_summary: "competitor X grew revenue 12% last quarter".to_string(),
        key_findings: vec![ResearchFinding {
            id: "f1".to_string(),
            claim: "revenue grew 12%".to_string(),
            evidence_ids: vec!["e1".to_string()],
            confidence: "high".to_string(),
        }],
        weak_evidence: false,
        follow_up_question: None,
    }
}

#[test]
fn a_clarifying_question_stops_the_loop_regardless_of_iteration() {
    let controller = ReasoningController::new(10);
    let artifacts = PlanExecutionArtifacts { clarifying_question: Some("which store?".to_string()), ..Default::default() };
    let decision = controller.decide(0, &PlanningContext::default(), &artifacts, None);
    assert!(!decision.continue_planning);
}

#[test]
fn an_analyst_error_with_no_supporting_data_flips_to_an_alternate_route() {
    let controller = ReasoningController::new(10);
    let mut context = PlanningContext::default();
    context.routing.previous_route = Some(Route::SimpleAnalyst);
    let artifacts = PlanExecutionArtifacts {
        analyst_error: Some("connector refused connection".to_string()),
        question: "how many orders".to_string(),
        ..Default::default()
    };
    let decision = controller.decide(0, &context, &artifacts, None);
    assert!(decision.continue_planning);
    assert_eq!(decision.updated_context.unwrap().routing.force_route, Some(Route::WebSearch));
}

#[test]
fn web_search_results_with_sources_are_promoted_to_deep_research() {
    let controller = ReasoningController::new(10);
    let artifacts = PlanExecutionArtifacts {
        question: "what are competitors doing".to_string(),
        web_search_result: Some(web_result_with_sources()),
        ..Default::default()
    };
    let decision = controller.decide(0, &PlanningContext::default(), &artifacts, None);
    assert!(decision.continue_planning);
    let updated = decision.updated_context.unwrap();
    assert_eq!(updated.routing.force_route, Some(Route::DeepResearch));
    assert_eq!(updated.documents.len(), 1);
}

#[test]
fn research_with_no_evidenced_findings_demotes_to_web_search() {
    let controller = ReasoningController::new(10);
    let artifacts = PlanExecutionArtifacts {
        question: "summarize the competitive landscape".to_string(),
        research_result: Some(research_report_with_no_sources()),
        ..Default::default()
    };
    let decision = controller.decide(0, &PlanningContext::default(), &artifacts, None);
    assert!(decision.continue_planning);
    assert_eq!(decision.updated_context.unwrap().routing.force_route, Some(Route::WebSearch));
}

#[test]
fn research_with_well_evidenced_findings_stops_the_loop() {
    let controller = ReasoningController::new(10);
    let artifacts = PlanExecutionArtifacts {
        question: "summarize the competitive landscape".to_string(),
        research_result: Some(research_report_with_sources()),
        ..Default::default()
    };
    let decision = controller.decide(0, &PlanningContext::default(), &artifacts, None);
    assert!(!decision.continue_planning);
}

#[test]
fn a_second_entity_resolution_attempt_is_not_retried_again() {
    let controller = ReasoningController::new(10);
    let mut context = PlanningContext::default();
    context.reasoning.entity_resolution = Some(vantage::orchestrator::planner::EntityResolutionState {
        entity_type: "store".to_string(),
        entity_phrase: "Acme".to_string(),
        original_question: "how much did store Acme sell".to_string(),
        probe_question: "List all stores".to_string(),
        attempts: 1,
    });
    let artifacts = PlanExecutionArtifacts { analyst_row_count: Some(0), question: "how much did store Acme sell".to_string(), ..Default::default() };
    let decision = controller.decide(0, &context, &artifacts, None);
    // no second entity-resolution retry; falls through to the empty-artifacts rule instead.
    assert!(decision.continue_planning);
    assert!(decision.updated_context.unwrap().routing.force_route.is_some());
}

#[test]
fn a_differently_normalized_repeated_error_is_not_treated_as_identical() {
    let controller = ReasoningController::new(10);
    let artifacts = PlanExecutionArtifacts { analyst_error: Some("connector timeout on host db-1".to_string()), ..Default::default() };
    let decision = controller.decide(0, &PlanningContext::default(), &artifacts, Some("connector timeout on host db-2"));
    assert!(decision.continue_planning);
}
