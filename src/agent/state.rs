//! Persisted agent memory

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::strategy::StrategyVersion;

/// Option side bought on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSide {
    /// Buy a call
    #[serde(rename = "BUY_CE")]
    BuyCe,
    /// Buy a put
    #[serde(rename = "BUY_PE")]
    BuyPe,
}

impl OptionSide {
    /// Calls above the threshold, puts at or below it
    pub fn from_spot(price: f64, threshold: f64) -> Self {
        if price > threshold {
            Self::BuyCe
        } else {
            Self::BuyPe
        }
    }
}

impl std::fmt::Display for OptionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuyCe => write!(f, "BUY_CE"),
            Self::BuyPe => write!(f, "BUY_PE"),
        }
    }
}

/// An open option position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Trade id, taken from the state's counter
    pub id: u64,

    /// Total premium paid (premium * lots * lot size)
    pub entry_cost: f64,

    /// Premium per unit at entry
    pub entry_premium: f64,

    /// Number of lots bought
    pub lots: u32,

    /// Call or put
    #[serde(rename = "type")]
    pub side: OptionSide,

    /// Local wall-clock time the order executed
    pub entry_time: NaiveDateTime,

    /// Broker order id, when the broker reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Everything the agent remembers between invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Cash available; not floored at zero
    pub capital: f64,

    /// Current risk regime
    #[serde(default)]
    pub strategy_version: StrategyVersion,

    /// Realized losses since the last regime change
    #[serde(default)]
    pub total_losses: f64,

    /// Open positions, oldest first
    #[serde(default)]
    pub positions: Vec<Position>,

    /// Last trade id handed out
    #[serde(default)]
    pub trade_id_counter: u64,
}

impl AgentState {
    /// Fresh memory for a first invocation
    pub fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            strategy_version: StrategyVersion::V1,
            total_losses: 0.0,
            positions: Vec::new(),
            trade_id_counter: 0,
        }
    }

    /// Check if flat (no open positions)
    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// Advance the trade counter and return the new id
    pub fn next_trade_id(&mut self) -> u64 {
        self.trade_id_counter = self.trade_id_counter.saturating_add(1);
        self.trade_id_counter
    }

    /// Capital committed to open positions
    pub fn exposure(&self) -> f64 {
        self.positions.iter().map(|p| p.entry_cost).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_from_spot() {
        assert_eq!(OptionSide::from_spot(23_050.0, 23_000.0), OptionSide::BuyCe);
        assert_eq!(OptionSide::from_spot(22_950.0, 23_000.0), OptionSide::BuyPe);
        // Exactly at the threshold is not "above"
        assert_eq!(OptionSide::from_spot(23_000.0, 23_000.0), OptionSide::BuyPe);
    }

    #[test]
    fn test_trade_ids_increase() {
        let mut state = AgentState::new(10_000.0);
        assert_eq!(state.next_trade_id(), 1);
        assert_eq!(state.next_trade_id(), 2);
        assert_eq!(state.trade_id_counter, 2);
    }

    #[test]
    fn test_reads_existing_state_file() {
        let json = r#"{
            "capital": 2345.5,
            "strategy_version": 1.0,
            "total_losses": 812.25,
            "positions": [
                {
                    "id": 7,
                    "entry_cost": 7250.0,
                    "entry_premium": 145.0,
                    "lots": 1,
                    "type": "BUY_CE",
                    "entry_time": "2025-01-14T09:45:12.123456"
                }
            ],
            "trade_id_counter": 7
        }"#;

        let state: AgentState = serde_json::from_str(json).unwrap();
        assert_eq!(state.strategy_version, StrategyVersion::V1);
        assert_eq!(state.positions.len(), 1);
        assert_eq!(state.positions[0].side, OptionSide::BuyCe);
        assert_eq!(state.positions[0].order_id, None);
        assert_eq!(state.exposure(), 7250.0);
        assert!(!state.is_flat());
    }

    #[test]
    fn test_writes_state_file_field_names() {
        let mut state = AgentState::new(10_000.0);
        state.positions.push(Position {
            id: 1,
            entry_cost: 5000.0,
            entry_premium: 100.0,
            lots: 1,
            side: OptionSide::BuyPe,
            entry_time: NaiveDateTime::parse_from_str("2025-01-14 09:45:12", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            order_id: Some("ORD_1".to_string()),
        });

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["strategy_version"], serde_json::json!(1.0));
        assert_eq!(value["positions"][0]["type"], "BUY_PE");
        assert_eq!(value["positions"][0]["entry_time"], "2025-01-14T09:45:12");
    }
}
