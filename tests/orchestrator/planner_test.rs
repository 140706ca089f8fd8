use vantage::orchestrator::planner::{EntityResolutionState, RoutingOverrides};
use vantage::orchestrator::{Plan, PlanAgent, Planner, PlannerRequest, PlanningConstraints, PlanningContext, Route};

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

fn plan_for(question: &str, context: PlanningContext, constraints: PlanningConstraints) -> Plan {
    Planner.plan(&PlannerRequest { question: question.to_string(), context, constraints })
}

#[test]
fn a_web_keyword_without_sql_signals_routes_to_web_search() {
    let mut context = PlanningContext::default();
    // Deep research also picks up a pure web-intent signal; excluding it
    // isolates the web-search scoring path for this question.
    context.routing.avoid_routes = vec![Route::DeepResearch];
    let plan = plan_for("what's in the news about our biggest competitor online", context, constraints());
    assert_eq!(plan.route, Route::WebSearch);
    assert_eq!(plan.steps[0].agent, PlanAgent::WebSearch);
}

#[test]
fn a_very_short_question_without_a_question_mark_is_ambiguous() {
    let plan = plan_for("our numbers", PlanningContext::default(), constraints());
    assert_eq!(plan.route, Route::Clarify);
    assert_eq!(plan.steps[0].agent, PlanAgent::Clarify);
}

#[test]
fn avoiding_a_route_keeps_it_from_ever_winning() {
    let mut context = PlanningContext::default();
    context.routing.avoid_routes = vec![Route::SimpleAnalyst, Route::AnalystThenVisual];
    let plan = plan_for("how many orders did we place last month", context, constraints());
    assert_ne!(plan.route, Route::SimpleAnalyst);
    assert_ne!(plan.route, Route::AnalystThenVisual);
}

#[test]
fn requiring_deep_research_via_overrides_tips_a_neutral_question_its_way() {
    let mut context = PlanningContext::default();
    context.routing.require_deep_research = true;
    let plan = plan_for("walk through vendor relationships for this fiscal quarter?", context, constraints());
    assert_eq!(plan.route, Route::DeepResearch);
}

#[test]
fn analyst_then_visual_links_the_visual_step_back_to_the_analyst_step() {
    let mut c = constraints();
    c.require_viz_when_chartable = true;
    let plan = plan_for("plot revenue trend for our stores over time", PlanningContext::default(), c);
    assert_eq!(plan.route, Route::AnalystThenVisual);
    let analyst_id = &plan.steps[0].id;
    let visual_step = plan.steps.last().unwrap();
    assert_eq!(visual_step.agent, PlanAgent::Visual);
    assert_eq!(visual_step.rows_ref.as_deref(), Some(analyst_id.as_str()));
}

#[test]
fn deep_research_inserts_a_web_search_precursor_when_required_and_no_documents_yet() {
    let mut context = PlanningContext::default();
    context.routing.require_deep_research = true;
    context.routing.require_web_search = true;
    let plan = plan_for("summarize the research on market trends", context, constraints());
    assert_eq!(plan.route, Route::DeepResearch);
    assert_eq!(plan.steps[0].agent, PlanAgent::WebSearch);
    assert_eq!(plan.steps[1].agent, PlanAgent::DocRetrieval);
    assert_eq!(plan.steps[1].source_step_ref.as_deref(), Some(plan.steps[0].id.as_str()));
}

#[test]
fn an_in_progress_entity_resolution_rewrites_the_question_with_a_follow_up() {
    let mut context = PlanningContext::default();
    context.reasoning.entity_resolution = Some(EntityResolutionState {
        entity_type: "store".to_string(),
        entity_phrase: "Acme".to_string(),
        original_question: "how much did store Acme sell".to_string(),
        probe_question: "List all stores".to_string(),
        attempts: 1,
    });
    let plan = plan_for("how much did store Acme sell", context, constraints());
    assert_eq!(plan.steps.len(), 2);
    let rewritten_input = &plan.steps[1].input;
    assert_eq!(rewritten_input.get("follow_up").and_then(|v| v.as_str()), Some("List all stores"));
}

#[test]
fn forcing_a_route_skips_clarification_even_for_an_ambiguous_question() {
    let mut context = PlanningContext::default();
    context.routing.force_route = Some(Route::SimpleAnalyst);
    let plan = plan_for("update me", context, constraints());
    assert_eq!(plan.route, Route::SimpleAnalyst);
}

#[test]
fn routing_overrides_default_to_no_preference() {
    let overrides = RoutingOverrides::default();
    assert!(overrides.force_route.is_none());
    assert!(overrides.prefer_routes.is_empty());
}
