//! Configuration for the decision engine

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the adaptive decision engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Capital the agent starts with (rupees)
    pub initial_capital: f64,

    /// Fraction of initial capital lost before switching to V2
    pub loss_threshold_pct: f64,

    /// Capital required per lot when sizing entries
    pub capital_per_lot: f64,

    /// Fraction of initial capital V2 is allowed to risk per entry
    pub risk_budget_pct: f64,

    /// Spot level above which the agent buys calls, puts otherwise
    pub signal_threshold: f64,

    /// Chance of closing the oldest position on a given cycle
    pub exit_probability: f64,

    /// Lower bound of simulated PnL as a fraction of entry cost
    pub pnl_min_pct: f64,

    /// Upper bound of simulated PnL as a fraction of entry cost
    pub pnl_max_pct: f64,

    /// Underlying to sample and trade (e.g., "NIFTY")
    pub symbol: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            loss_threshold_pct: 0.25,
            capital_per_lot: 7_500.0,
            risk_budget_pct: 0.10,
            signal_threshold: 23_000.0,
            exit_probability: 0.5,
            pnl_min_pct: -0.15,
            pnl_max_pct: 0.20,
            symbol: "NIFTY".to_string(),
        }
    }
}

impl AgentConfig {
    /// Losses at which the agent abandons V1
    pub fn adaptation_threshold(&self) -> f64 {
        self.initial_capital * self.loss_threshold_pct
    }

    /// Capital V2 will commit to a single entry
    pub fn risk_budget(&self) -> f64 {
        self.initial_capital * self.risk_budget_pct
    }

    /// Reject settings the engine cannot sample with
    pub fn validate(&self) -> Result<()> {
        let amounts = [
            ("initial capital", self.initial_capital),
            ("capital per lot", self.capital_per_lot),
            ("loss threshold", self.loss_threshold_pct),
            ("risk budget", self.risk_budget_pct),
            ("signal threshold", self.signal_threshold),
            ("PnL lower bound", self.pnl_min_pct),
            ("PnL upper bound", self.pnl_max_pct),
        ];
        // Non-finite values would persist as null and poison the state file
        if let Some((name, value)) = amounts.iter().find(|(_, v)| !v.is_finite()) {
            bail!("{} must be finite, got {}", name, value);
        }
        if !(self.initial_capital > 0.0) {
            bail!("initial capital must be positive, got {}", self.initial_capital);
        }
        if !(self.capital_per_lot > 0.0) {
            bail!("capital per lot must be positive, got {}", self.capital_per_lot);
        }
        if !(0.0..=1.0).contains(&self.exit_probability) {
            bail!("exit probability must be within [0, 1], got {}", self.exit_probability);
        }
        if !(self.pnl_min_pct <= self.pnl_max_pct) {
            bail!(
                "PnL range is inverted ({} > {})",
                self.pnl_min_pct,
                self.pnl_max_pct
            );
        }
        if self.symbol.trim().is_empty() {
            bail!("symbol must not be empty");
        }
        Ok(())
    }
}
