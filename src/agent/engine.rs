//! Decision engine - one adaptive trading decision per cycle
//!
//! Each cycle runs three checks in order:
//! 1. Adaptation: abandon V1 once cumulative losses cross the threshold
//! 2. Exit: maybe close the oldest open position
//! 3. Entry: when flat, sample the spot price and buy one option contract
//!
//! The engine owns no I/O of its own. State comes in by value, randomness and
//! the broker are injected, and the caller decides where the state goes next.

use anyhow::Result;
use chrono::Local;
use rand::Rng;
use tracing::{debug, info, warn};

use super::config::AgentConfig;
use super::state::{AgentState, OptionSide, Position};
use super::strategy::StrategyVersion;
use crate::broker::{BrokerGateway, OrderRequest, OrderResponse, OrderSide};

/// A position closed during a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub position: Position,
    /// Realized PnL in rupees
    pub pnl: f64,
}

/// Result of a single decision cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Updated memory to persist
    pub state: AgentState,
    /// Human-readable decisions, in order
    pub log: Vec<String>,
    /// Strategy switched from V1 to V2 this cycle
    pub adapted: bool,
    /// Position closed this cycle
    pub closed: Option<ClosedTrade>,
    /// Position opened this cycle
    pub opened: Option<Position>,
}

/// Applies the adaptation, exit and entry rules
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: AgentConfig,
}

impl DecisionEngine {
    /// Fails on settings the engine cannot sample with
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one decision cycle against `state`
    pub async fn run<B, R>(&self, mut state: AgentState, broker: &mut B, rng: &mut R) -> CycleOutcome
    where
        B: BrokerGateway + ?Sized,
        R: Rng + Send,
    {
        let mut log = Vec::new();

        let adapted = self.adapt(&mut state, &mut log);
        let closed = self.maybe_exit(&mut state, rng, &mut log);
        let opened = self.maybe_enter(&mut state, broker, &mut log).await;

        CycleOutcome {
            state,
            log,
            adapted,
            closed,
            opened,
        }
    }

    /// Switch V1 -> V2 once losses reach the threshold. Never reverts.
    fn adapt(&self, state: &mut AgentState, log: &mut Vec<String>) -> bool {
        let threshold = self.config.adaptation_threshold();
        if state.strategy_version >= StrategyVersion::V2 || state.total_losses < threshold {
            return false;
        }

        warn!(
            "Losses {:.2} reached threshold {:.2}, switching to strategy 2.0",
            state.total_losses, threshold
        );
        log.push(format!(
            "ADAPTATION: CRITICAL. Total losses (₹{:.2}) exceeded {:.0}% threshold.",
            state.total_losses,
            self.config.loss_threshold_pct * 100.0
        ));
        log.push(format!(
            "Switching to Strategy 2.0: Risk Management ({:.0}% max risk).",
            self.config.risk_budget_pct * 100.0
        ));

        state.strategy_version = StrategyVersion::V2;
        state.total_losses = 0.0;
        true
    }

    /// Coin-flip close of the oldest position with a simulated PnL
    fn maybe_exit<R: Rng>(
        &self,
        state: &mut AgentState,
        rng: &mut R,
        log: &mut Vec<String>,
    ) -> Option<ClosedTrade> {
        if state.is_flat() {
            return None;
        }
        if !rng.gen_bool(self.config.exit_probability) {
            debug!("Holding {} open position(s)", state.positions.len());
            return None;
        }

        let position = state.positions.remove(0);
        let pnl_pct = rng.gen_range(self.config.pnl_min_pct..=self.config.pnl_max_pct);
        let pnl = position.entry_cost * pnl_pct;

        state.capital += position.entry_cost + pnl;
        if pnl < 0.0 {
            state.total_losses += -pnl;
        }

        info!(
            "Closed trade {} ({}) PnL {:.2}, capital {:.2}",
            position.id, position.side, pnl, state.capital
        );
        log.push(format!(
            "CLOSE: Trade {} completed ({}). PnL: ₹{:.2}.",
            position.id, position.side, pnl
        ));

        Some(ClosedTrade { position, pnl })
    }

    /// When flat, sample the spot, size by strategy and place one order
    async fn maybe_enter<B>(
        &self,
        state: &mut AgentState,
        broker: &mut B,
        log: &mut Vec<String>,
    ) -> Option<Position>
    where
        B: BrokerGateway + ?Sized,
    {
        if !state.is_flat() {
            return None;
        }

        let price = match broker.get_price(&self.config.symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Price fetch from {} failed: {}", broker.name(), e);
                log.push(format!("ERROR: Price fetch failed. {}.", e));
                return None;
            }
        };

        let signal = OptionSide::from_spot(price, self.config.signal_threshold);
        let lots = state.strategy_version.lots(state.capital, &self.config);
        debug!("{} at {:.2} -> {} x{}", self.config.symbol, price, signal, lots);

        log.push(match state.strategy_version {
            StrategyVersion::V1 => format!(
                "AGGRESSIVE_TRADE: Strategy 1.0 buying {} lots (High Risk).",
                lots
            ),
            StrategyVersion::V2 => format!(
                "CAPPED_TRADE: Strategy 2.0 buying {} lot(s) ({:.0}% Risk).",
                lots,
                self.config.risk_budget_pct * 100.0
            ),
        });

        let request = OrderRequest {
            symbol: self.config.symbol.clone(),
            lots,
            side: OrderSide::Buy,
            option: signal,
        };

        let fill = match broker.place_order(&request).await {
            Ok(OrderResponse::Executed(fill)) => fill,
            Ok(OrderResponse::Rejected { error }) => {
                warn!("Order rejected by {}: {}", broker.name(), error);
                log.push(format!("ERROR: Order rejected. {}.", error));
                return None;
            }
            Err(e) => {
                warn!("Order to {} failed: {}", broker.name(), e);
                log.push(format!("ERROR: Order rejected. {}.", e));
                return None;
            }
        };

        if fill.entry_cost > state.capital {
            // Affordability is not checked before ordering; capital may go negative
            warn!(
                "Entry cost {:.2} exceeds capital {:.2}",
                fill.entry_cost, state.capital
            );
        }

        let position = Position {
            id: state.next_trade_id(),
            entry_cost: fill.entry_cost,
            entry_premium: fill.entry_premium,
            lots,
            side: signal,
            entry_time: Local::now().naive_local(),
            order_id: Some(fill.order_id),
        };
        state.capital -= position.entry_cost;
        state.positions.push(position.clone());

        info!(
            "Opened trade {} ({} x{}) cost {:.2}, capital {:.2}",
            position.id, position.side, position.lots, position.entry_cost, state.capital
        );
        log.push(format!(
            "OPEN: Trade {} placed ({}). Capital: ₹{:.2}.",
            position.id, position.side, state.capital
        ));

        Some(position)
    }
}
