//! Adaptive trading agent
//!
//! This module holds the agent's memory model, the rule-based decision
//! engine and the per-invocation runner that ties them to a store and a
//! broker.

mod config;
mod engine;
mod runner;
mod state;
mod strategy;

pub use config::AgentConfig;
pub use engine::{ClosedTrade, CycleOutcome, DecisionEngine};
pub use runner::{Agent, CycleReport, SUMMARY_HEADER};
pub use state::{AgentState, OptionSide, Position};
pub use strategy::StrategyVersion;
