// Library crate - exports the agent, its gateways and the HTTP surface

pub mod agent;
pub mod angel_one;
pub mod api;
pub mod broker;
pub mod cli;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use agent::{Agent, AgentConfig, AgentState, CycleReport, DecisionEngine, StrategyVersion};
pub use types::AppState;
