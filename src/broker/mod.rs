//! Broker gateway abstraction
//!
//! The decision engine only ever talks to a [`BrokerGateway`]. Three
//! implementations ship with the crate:
//!
//! - [`SimulatedBroker`] - seeded paper broker (default)
//! - [`ScriptedBroker`] - replays canned prices and order responses
//! - [`crate::angel_one::AngelOneGateway`] - Angel One SmartAPI over REST

mod paper;
mod scripted;

pub use paper::{PaperConfig, SimulatedBroker};
pub use scripted::ScriptedBroker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::OptionSide;

/// Errors raised by a broker gateway
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker credentials not configured: {0}")]
    MissingCredentials(String),
    #[error("broker session not established")]
    NotConnected,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("no contract configured for {0}")]
    NoContract(OptionSide),
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
        }
    }
}

/// Order the engine asks the broker to place
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Underlying symbol (e.g., "NIFTY")
    pub symbol: String,
    /// Number of lots
    pub lots: u32,
    /// Buy or sell
    pub side: OrderSide,
    /// Which option contract to trade
    pub option: OptionSide,
}

/// Details of an executed order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub order_id: String,
    /// Total premium paid
    pub entry_cost: f64,
    /// Premium per unit
    pub entry_premium: f64,
}

/// Broker's answer to an order
#[derive(Debug, Clone, PartialEq)]
pub enum OrderResponse {
    Executed(OrderFill),
    Rejected { error: String },
}

/// Narrow capability interface the decision engine depends on
#[async_trait]
pub trait BrokerGateway: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Establish (or re-validate) a session
    async fn connect(&mut self) -> Result<(), BrokerError>;

    /// Latest traded price of the underlying
    async fn get_price(&mut self, symbol: &str) -> Result<f64, BrokerError>;

    /// Place an order; a broker-side refusal is `Ok(Rejected)`
    async fn place_order(&mut self, request: &OrderRequest) -> Result<OrderResponse, BrokerError>;
}
