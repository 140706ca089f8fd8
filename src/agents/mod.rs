//! Agents: the tagged capability-consumers a [`crate::orchestrator`] plan
//! step dispatches to (Analyst, WebSearch, DeepResearch). Visual rendering
//! and document retrieval are pass-through step kinds with no dedicated
//! agent module, per the supervisor's step dispatch table.

pub mod analyst;
pub mod research;
pub mod web_search;
