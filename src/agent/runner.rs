//! Per-invocation wiring: connect, load, decide, save, summarize

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use super::config::AgentConfig;
use super::engine::{CycleOutcome, DecisionEngine};
use super::state::AgentState;
use crate::broker::BrokerGateway;
use crate::store::StateStore;

/// First line of every cycle summary
pub const SUMMARY_HEADER: &str = "Quant Agent Cycle Completed:";

/// What a cycle reports back to the trigger
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Engine decisions plus any persistence error
    pub lines: Vec<String>,
    /// State as it was handed to the store
    pub state: AgentState,
    /// The broker session could not be established
    pub broker_unavailable: bool,
    /// The state could not be persisted
    pub save_failed: bool,
}

impl CycleReport {
    pub fn final_capital(&self) -> f64 {
        self.state.capital
    }

    /// Plain-text response body
    pub fn summary(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() + 2);
        out.push(SUMMARY_HEADER.to_string());
        out.extend(self.lines.iter().cloned());
        out.push(format!("FINAL CAPITAL: ₹{:.2}", self.final_capital()));
        out.join("\n")
    }
}

/// The agent: engine plus the store, broker and RNG it runs against
pub struct Agent {
    engine: DecisionEngine,
    store: Box<dyn StateStore>,
    broker: Box<dyn BrokerGateway>,
    rng: StdRng,
}

impl Agent {
    /// Create an agent whose exits are driven by OS entropy
    pub fn new(
        config: AgentConfig,
        store: Box<dyn StateStore>,
        broker: Box<dyn BrokerGateway>,
    ) -> Result<Self> {
        Self::with_rng(config, store, broker, StdRng::from_entropy())
    }

    /// Create an agent whose exits replay for a given seed
    pub fn seeded(
        config: AgentConfig,
        store: Box<dyn StateStore>,
        broker: Box<dyn BrokerGateway>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(config, store, broker, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: AgentConfig,
        store: Box<dyn StateStore>,
        broker: Box<dyn BrokerGateway>,
        rng: StdRng,
    ) -> Result<Self> {
        Ok(Self {
            engine: DecisionEngine::new(config)?,
            store,
            broker,
            rng,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        self.engine.config()
    }

    /// Persisted memory, or a fresh one when nothing usable is stored
    pub fn current_state(&self) -> AgentState {
        let initial_capital = self.config().initial_capital;
        match self.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => AgentState::new(initial_capital),
            Err(e) => {
                warn!("Could not load state, starting from defaults: {:#}", e);
                AgentState::new(initial_capital)
            }
        }
    }

    /// Run one full invocation. Never fails; problems end up in the report.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let broker_unavailable = match self.broker.connect().await {
            Ok(()) => false,
            Err(e) => {
                warn!(
                    "Broker {} unavailable, continuing without a session: {}",
                    self.broker.name(),
                    e
                );
                true
            }
        };

        let state = self.current_state();
        let CycleOutcome { state, mut log, .. } = self
            .engine
            .run(state, self.broker.as_mut(), &mut self.rng)
            .await;

        info!(
            "{} position(s) open, exposure {:.2}",
            state.positions.len(),
            state.exposure()
        );

        let save_failed = match self.store.save(&state) {
            Ok(()) => false,
            Err(e) => {
                error!("Could not save state: {:#}", e);
                log.push(format!("ERROR: Could not save state. {:#}.", e));
                true
            }
        };

        let report = CycleReport {
            lines: log,
            state,
            broker_unavailable,
            save_failed,
        };

        for line in report.summary().lines() {
            info!("{}", line);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StrategyVersion;
    use crate::broker::{PaperConfig, ScriptedBroker, SimulatedBroker};
    use crate::store::{FileStateStore, MemoryStateStore};
    use anyhow::{anyhow, Result};
    use std::sync::Arc;

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self) -> Result<Option<AgentState>> {
            Err(anyhow!("disk on fire"))
        }

        fn save(&self, _state: &AgentState) -> Result<()> {
            Err(anyhow!("read-only filesystem"))
        }
    }

    #[tokio::test]
    async fn test_first_cycle_starts_from_defaults() {
        let store = Arc::new(MemoryStateStore::new());
        let broker = ScriptedBroker::new()
            .with_price(23_050.0)
            .with_fill("ORD_1", 150.0, 7_500.0);

        let mut agent = Agent::seeded(
            AgentConfig::default(),
            Box::new(store.clone()),
            Box::new(broker),
            1,
        )
        .unwrap();
        let report = agent.run_cycle().await;

        assert!(!report.save_failed);
        assert!(!report.broker_unavailable);
        assert_eq!(report.final_capital(), 2_500.0);

        let saved = store.snapshot().expect("state saved");
        assert_eq!(saved.trade_id_counter, 1);
        assert_eq!(saved.positions.len(), 1);

        let summary = report.summary();
        assert!(summary.starts_with(SUMMARY_HEADER));
        assert!(summary.ends_with("FINAL CAPITAL: ₹2500.00"));
    }

    #[test]
    fn test_rejects_non_finite_capital() {
        let config = AgentConfig {
            initial_capital: f64::INFINITY,
            ..Default::default()
        };
        let agent = Agent::seeded(
            config,
            Box::new(MemoryStateStore::new()),
            Box::new(ScriptedBroker::new()),
            1,
        );
        assert!(agent.is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_is_not_fatal() {
        let store = Arc::new(MemoryStateStore::new());
        let broker = ScriptedBroker::new()
            .failing_connect()
            .with_price(22_000.0)
            .with_rejection("no session");

        let mut agent = Agent::seeded(
            AgentConfig::default(),
            Box::new(store.clone()),
            Box::new(broker),
            1,
        )
        .unwrap();
        let report = agent.run_cycle().await;

        assert!(report.broker_unavailable);
        assert_eq!(report.final_capital(), 10_000.0);
        assert!(store.snapshot().is_some());
    }

    #[tokio::test]
    async fn test_store_failures_fall_back_and_surface() {
        let broker = ScriptedBroker::new().with_price(22_000.0).with_rejection("margin");
        let mut agent = Agent::seeded(
            AgentConfig::default(),
            Box::new(BrokenStore),
            Box::new(broker),
            1,
        )
        .unwrap();

        let report = agent.run_cycle().await;

        assert!(report.save_failed);
        assert_eq!(report.state, AgentState::new(10_000.0));
        assert_eq!(report.state.strategy_version, StrategyVersion::V1);
        assert!(report
            .lines
            .iter()
            .any(|l| l.starts_with("ERROR: Could not save state.")));
    }

    #[tokio::test]
    async fn test_state_carries_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_state.json");

        let mut last_counter = 0;
        for seed in 0..25 {
            // Each invocation builds a fresh agent, like a cold-started function
            let mut agent = Agent::seeded(
                AgentConfig::default(),
                Box::new(FileStateStore::new(&path)),
                Box::new(SimulatedBroker::seeded(PaperConfig::default(), seed)),
                seed,
            )
            .unwrap();
            let report = agent.run_cycle().await;
            assert!(!report.save_failed);
            assert!(report.state.trade_id_counter >= last_counter);
            last_counter = report.state.trade_id_counter;
        }

        let persisted = FileStateStore::new(&path).load().unwrap().unwrap();
        assert_eq!(persisted.trade_id_counter, last_counter);
    }
}
