//! Deterministic broker double
//!
//! Replays queued prices and order responses and records every request, so
//! callers can assert on exactly what the engine asked for.

use std::collections::VecDeque;

use async_trait::async_trait;

use super::{BrokerError, BrokerGateway, OrderFill, OrderRequest, OrderResponse};

/// Broker that answers from pre-loaded queues
#[derive(Debug, Default)]
pub struct ScriptedBroker {
    prices: VecDeque<f64>,
    responses: VecDeque<OrderResponse>,
    fail_connect: bool,
    orders: Vec<OrderRequest>,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a price for the next `get_price` call
    pub fn with_price(mut self, price: f64) -> Self {
        self.prices.push_back(price);
        self
    }

    /// Queue an execution for the next order
    pub fn with_fill(mut self, order_id: &str, entry_premium: f64, entry_cost: f64) -> Self {
        self.responses.push_back(OrderResponse::Executed(OrderFill {
            order_id: order_id.to_string(),
            entry_cost,
            entry_premium,
        }));
        self
    }

    /// Queue a rejection for the next order
    pub fn with_rejection(mut self, error: &str) -> Self {
        self.responses.push_back(OrderResponse::Rejected {
            error: error.to_string(),
        });
        self
    }

    /// Make every connect() fail
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Orders received so far
    pub fn orders(&self) -> &[OrderRequest] {
        &self.orders
    }
}

#[async_trait]
impl BrokerGateway for ScriptedBroker {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn connect(&mut self) -> Result<(), BrokerError> {
        if self.fail_connect {
            return Err(BrokerError::MissingCredentials("scripted".to_string()));
        }
        Ok(())
    }

    async fn get_price(&mut self, _symbol: &str) -> Result<f64, BrokerError> {
        self.prices
            .pop_front()
            .ok_or_else(|| BrokerError::BadResponse("no scripted price left".to_string()))
    }

    async fn place_order(&mut self, request: &OrderRequest) -> Result<OrderResponse, BrokerError> {
        self.orders.push(request.clone());
        self.responses
            .pop_front()
            .ok_or_else(|| BrokerError::BadResponse("no scripted order response left".to_string()))
    }
}
