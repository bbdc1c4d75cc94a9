//! Simulated paper broker
//!
//! Prices and fills are drawn from a seedable RNG so a run can be replayed.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{BrokerError, BrokerGateway, OrderFill, OrderRequest, OrderResponse};

/// Settings for the simulated market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Spot level prices fluctuate around
    pub base_price: f64,
    /// Maximum distance from the base price in either direction
    pub price_jitter: f64,
    /// Lowest simulated option premium
    pub premium_min: f64,
    /// Highest simulated option premium
    pub premium_max: f64,
    /// Units per lot (NIFTY = 50)
    pub lot_size: u32,
    /// Chance an order is refused
    pub rejection_probability: f64,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            base_price: 23_000.0,
            price_jitter: 100.0,
            premium_min: 100.0,
            premium_max: 200.0,
            lot_size: 50,
            rejection_probability: 0.1,
        }
    }
}

impl PaperConfig {
    /// Reject ranges the RNG cannot sample
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.premium_min <= self.premium_max) {
            anyhow::bail!(
                "premium range is inverted ({} > {})",
                self.premium_min,
                self.premium_max
            );
        }
        if !self.price_jitter.is_finite() || !self.base_price.is_finite() {
            anyhow::bail!("simulated price settings must be finite");
        }
        if self.lot_size == 0 {
            anyhow::bail!("lot size must be at least 1");
        }
        Ok(())
    }
}

/// Paper broker that never leaves the process
pub struct SimulatedBroker {
    config: PaperConfig,
    rng: StdRng,
    connected: bool,
}

impl SimulatedBroker {
    /// Create a simulated broker seeded from OS entropy
    pub fn new(config: PaperConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a simulated broker that replays the same sequence for a seed
    pub fn seeded(config: PaperConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PaperConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            connected: false,
        }
    }

    /// Check if connect() has been called
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[async_trait]
impl BrokerGateway for SimulatedBroker {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn connect(&mut self) -> Result<(), BrokerError> {
        if !self.connected {
            info!("Simulation mode - no broker connection required");
        }
        self.connected = true;
        Ok(())
    }

    async fn get_price(&mut self, symbol: &str) -> Result<f64, BrokerError> {
        let jitter = self.config.price_jitter.abs();
        let price = self.config.base_price + self.rng.gen_range(-jitter..=jitter);
        debug!("Simulated {} price: {:.2}", symbol, price);
        Ok(price)
    }

    async fn place_order(&mut self, request: &OrderRequest) -> Result<OrderResponse, BrokerError> {
        // Premium is drawn before the rejection roll so seeded runs line up
        let premium = self
            .rng
            .gen_range(self.config.premium_min..=self.config.premium_max);
        let cost = premium * request.lots as f64 * self.config.lot_size as f64;

        if self.rng.gen::<f64>() < self.config.rejection_probability {
            debug!("Simulated rejection for {} {} lots", request.option, request.lots);
            return Ok(OrderResponse::Rejected {
                error: "Simulated Slippage/Margin failure".to_string(),
            });
        }

        Ok(OrderResponse::Executed(OrderFill {
            order_id: format!("ORD_{}", Utc::now().timestamp_millis()),
            entry_cost: cost,
            entry_premium: premium,
        }))
    }
}
