use serde::Serialize;
use tokio::sync::Mutex;

use crate::agent::{Agent, AgentState, CycleReport};

/// Shared application state
pub struct AppState {
    /// Cycles run one at a time so read-modify-write of the state slot
    /// cannot interleave within this process
    pub agent: Mutex<Agent>,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Mutex::new(agent),
        }
    }
}

/// JSON view of a completed cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleResponse {
    pub lines: Vec<String>,
    #[serde(rename = "finalCapital")]
    pub final_capital: f64,
    #[serde(rename = "brokerUnavailable")]
    pub broker_unavailable: bool,
    #[serde(rename = "saveFailed")]
    pub save_failed: bool,
    pub state: AgentState,
}

impl From<CycleReport> for CycleResponse {
    fn from(report: CycleReport) -> Self {
        Self {
            final_capital: report.final_capital(),
            lines: report.lines,
            broker_unavailable: report.broker_unavailable,
            save_failed: report.save_failed,
            state: report.state,
        }
    }
}
