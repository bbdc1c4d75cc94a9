//! Command-line and environment configuration shared by the binaries

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::info;

use crate::agent::{Agent, AgentConfig};
use crate::angel_one::AngelOneGateway;
use crate::broker::{BrokerGateway, PaperConfig, SimulatedBroker};
use crate::store::{FileStateStore, DEFAULT_STATE_FILE};

/// Which broker gateway to trade through
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrokerKind {
    /// Seeded in-process simulation
    Paper,
    /// Angel One SmartAPI
    AngelOne,
}

impl std::fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "paper"),
            Self::AngelOne => write!(f, "angel-one"),
        }
    }
}

/// Agent settings, from flags or environment
#[derive(clap::Args, Debug, Clone)]
pub struct AgentArgs {
    /// Path of the persisted agent state
    #[arg(long, env = "AGENT_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Broker gateway to use
    #[arg(long, env = "AGENT_BROKER", value_enum, default_value_t = BrokerKind::Paper)]
    pub broker: BrokerKind,

    /// Seed for replayable runs (OS entropy when omitted)
    #[arg(long, env = "AGENT_SEED")]
    pub seed: Option<u64>,

    /// Capital the agent starts with
    #[arg(long, env = "AGENT_INITIAL_CAPITAL", default_value_t = 10_000.0)]
    pub initial_capital: f64,

    /// Underlying to trade
    #[arg(long, env = "AGENT_SYMBOL", default_value = "NIFTY")]
    pub symbol: String,

    /// Units per lot
    #[arg(long, env = "AGENT_LOT_SIZE", default_value_t = 50)]
    pub lot_size: u32,
}

impl AgentArgs {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            initial_capital: self.initial_capital,
            symbol: self.symbol.clone(),
            ..Default::default()
        }
    }

    fn broker(&self) -> Result<Box<dyn BrokerGateway>> {
        match self.broker {
            BrokerKind::Paper => {
                let config = PaperConfig {
                    lot_size: self.lot_size,
                    ..Default::default()
                };
                config.validate()?;
                Ok(match self.seed {
                    Some(seed) => Box::new(SimulatedBroker::seeded(config, seed)),
                    None => Box::new(SimulatedBroker::new(config)),
                })
            }
            BrokerKind::AngelOne => {
                let gateway = AngelOneGateway::from_env(self.lot_size)
                    .context("Failed to create Angel One gateway")?;
                Ok(Box::new(gateway))
            }
        }
    }

    /// Assemble an agent backed by the state file and the chosen broker
    pub fn build_agent(&self) -> Result<Agent> {
        let config = self.agent_config();
        let store = Box::new(FileStateStore::new(&self.state_file));
        let broker = self.broker()?;

        info!("State file: {}", self.state_file.display());
        info!("Broker: {}", self.broker);

        match self.seed {
            // Offset so exits don't mirror the broker's draws
            Some(seed) => Agent::seeded(config, store, broker, seed.wrapping_add(1)),
            None => Agent::new(config, store, broker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        agent: AgentArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.agent.broker, BrokerKind::Paper);
        assert_eq!(cli.agent.lot_size, 50);
        assert_eq!(cli.agent.agent_config().initial_capital, 10_000.0);
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::parse_from([
            "test",
            "--broker",
            "angel-one",
            "--seed",
            "9",
            "--state-file",
            "/var/tmp/s.json",
            "--initial-capital",
            "25000",
        ]);
        assert_eq!(cli.agent.broker, BrokerKind::AngelOne);
        assert_eq!(cli.agent.seed, Some(9));
        assert_eq!(cli.agent.state_file, PathBuf::from("/var/tmp/s.json"));
        assert_eq!(cli.agent.agent_config().adaptation_threshold(), 6_250.0);
    }

    #[test]
    fn test_build_rejects_infinite_capital() {
        let cli = TestCli::parse_from(["test", "--initial-capital", "inf"]);
        assert!(cli.agent.agent_config().initial_capital.is_infinite());
        assert!(cli.agent.build_agent().is_err());
    }

    #[tokio::test]
    async fn test_build_paper_agent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let cli = TestCli::parse_from([
            "test",
            "--seed",
            "3",
            "--state-file",
            path.to_str().unwrap(),
        ]);

        let mut agent = cli.agent.build_agent().unwrap();
        let report = agent.run_cycle().await;
        assert!(!report.save_failed);
        assert!(path.exists());
    }
}
