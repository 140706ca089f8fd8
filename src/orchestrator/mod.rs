//! Orchestrator: Planner/Router (C7), Reasoning Controller (C9), and the
//! Supervisor (C8) that drives one request's plan/dispatch/reason loop.

pub mod planner;
pub mod reasoning;
pub mod supervisor;

pub use planner::{Plan, PlanAgent, PlanStep, Planner, PlannerRequest, PlanningConstraints, PlanningContext, Route};
pub use reasoning::{PlanExecutionArtifacts, ReasoningController, ReasoningDecision, ToolCallRecord};
pub use supervisor::{StepOutput, Supervisor, SupervisorResult};
