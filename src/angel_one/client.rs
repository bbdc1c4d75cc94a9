//! Angel One SmartAPI gateway
//!
//! REST client implementing [`BrokerGateway`] on top of SmartAPI. Session
//! creation (password + TOTP login) happens out of band; this client only
//! carries the resulting JWT.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::models::*;
use crate::agent::OptionSide;
use crate::broker::{BrokerError, BrokerGateway, OrderFill, OrderRequest, OrderResponse};

/// Production base URL
pub const BASE_URL: &str = "https://apiconnect.angelbroking.com";

const PROFILE_PATH: &str = "/rest/secure/angelbroking/user/v1/getProfile";
const LTP_PATH: &str = "/rest/secure/angelbroking/order/v1/getLtpData";
const PLACE_ORDER_PATH: &str = "/rest/secure/angelbroking/order/v1/placeOrder";

/// API credentials for SmartAPI
#[derive(Debug, Clone)]
pub struct AngelOneCredentials {
    /// SmartAPI app key (`X-PrivateKey`)
    pub api_key: String,
    /// Angel One client code
    pub client_id: String,
    /// Session JWT, if one has been issued
    pub access_token: Option<String>,
}

impl AngelOneCredentials {
    /// Read credentials from environment variables
    ///
    /// Expects:
    /// - `ANGELONE_API_KEY` - SmartAPI app key
    /// - `ANGELONE_CLIENT_ID` - Angel One client code
    /// - `ANGELONE_ACCESS_TOKEN` (optional) - session JWT
    pub fn from_env() -> Result<Self, BrokerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BrokerError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("ANGELONE_API_KEY")
            .ok_or_else(|| BrokerError::MissingCredentials("ANGELONE_API_KEY".to_string()))?;
        let client_id = non_empty("ANGELONE_CLIENT_ID")
            .ok_or_else(|| BrokerError::MissingCredentials("ANGELONE_CLIENT_ID".to_string()))?;

        Ok(Self {
            api_key,
            client_id,
            access_token: non_empty("ANGELONE_ACCESS_TOKEN"),
        })
    }
}

/// Instruments the gateway quotes and trades
#[derive(Debug, Clone)]
pub struct ContractBook {
    /// Underlying sampled for the entry signal
    pub spot: Instrument,
    /// Call bought on BUY_CE
    pub call: Option<Instrument>,
    /// Put bought on BUY_PE
    pub put: Option<Instrument>,
}

impl Default for ContractBook {
    fn default() -> Self {
        Self {
            spot: Instrument::nifty_spot(),
            call: None,
            put: None,
        }
    }
}

impl ContractBook {
    /// Read option contracts from environment variables
    ///
    /// - `ANGELONE_CE_SYMBOL` / `ANGELONE_CE_TOKEN` - call contract on NFO
    /// - `ANGELONE_PE_SYMBOL` / `ANGELONE_PE_TOKEN` - put contract on NFO
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let contract = |prefix: &str| {
            let symbol = lookup(&format!("ANGELONE_{}_SYMBOL", prefix))?;
            let token = lookup(&format!("ANGELONE_{}_TOKEN", prefix))?;
            Some(Instrument::new("NFO", symbol.trim(), token.trim()))
        };

        Self {
            call: contract("CE"),
            put: contract("PE"),
            ..Default::default()
        }
    }

    /// Contract to buy for a signal
    pub fn for_side(&self, side: OptionSide) -> Option<&Instrument> {
        match side {
            OptionSide::BuyCe => self.call.as_ref(),
            OptionSide::BuyPe => self.put.as_ref(),
        }
    }
}

/// SmartAPI-backed broker gateway
pub struct AngelOneGateway {
    client: Client,
    base_url: String,
    credentials: Option<AngelOneCredentials>,
    contracts: ContractBook,
    lot_size: u32,
    connected: bool,
}

impl AngelOneGateway {
    /// Create a gateway from environment variables
    ///
    /// Missing credentials do not fail construction; the gateway then acts as
    /// a stub whose calls all fail.
    pub fn from_env(lot_size: u32) -> Result<Self, BrokerError> {
        let credentials = match AngelOneCredentials::from_env() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!("Angel One gateway disabled: {}", e);
                None
            }
        };
        Self::new(credentials, ContractBook::from_env(), lot_size, BASE_URL.to_string())
    }

    /// Create a gateway with explicit configuration
    pub fn new(
        credentials: Option<AngelOneCredentials>,
        contracts: ContractBook,
        lot_size: u32,
        base_url: String,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            contracts,
            lot_size,
            connected: false,
        })
    }

    /// Check if the session was validated
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Attach the headers SmartAPI requires on secure routes
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, BrokerError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| BrokerError::MissingCredentials("ANGELONE_API_KEY".to_string()))?;
        let token = credentials
            .access_token
            .as_deref()
            .ok_or_else(|| BrokerError::MissingCredentials("ANGELONE_ACCESS_TOKEN".to_string()))?;

        Ok(request
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-UserType", "USER")
            .header("X-SourceID", "WEB")
            .header("X-ClientLocalIP", "127.0.0.1")
            .header("X-ClientPublicIP", "127.0.0.1")
            .header("X-MACAddress", "00:00:00:00:00:00")
            .header("X-PrivateKey", &credentials.api_key))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, BrokerError> {
        let response = self.authorize(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BrokerError::BadResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, BrokerError> {
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        self.send(request).await
    }

    /// Last traded price of an instrument
    async fn ltp(&self, instrument: &Instrument) -> Result<f64, BrokerError> {
        let response: ApiResponse<LtpData> = self.post(LTP_PATH, instrument).await?;
        if !response.status {
            return Err(BrokerError::BadResponse(response.describe_error()));
        }
        let data = response
            .data
            .ok_or_else(|| BrokerError::BadResponse("LTP payload missing".to_string()))?;

        debug!("LTP {} = {}", data.tradingsymbol, data.ltp);
        Ok(data.ltp)
    }

    fn ensure_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

#[async_trait]
impl BrokerGateway for AngelOneGateway {
    fn name(&self) -> &'static str {
        "angel-one"
    }

    async fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;

        let client_id = match &self.credentials {
            Some(credentials) => credentials.client_id.clone(),
            None => {
                return Err(BrokerError::MissingCredentials(
                    "ANGELONE_API_KEY / ANGELONE_CLIENT_ID".to_string(),
                ))
            }
        };

        info!("Validating Angel One session for {}...", client_id);
        let request = self.client.get(format!("{}{}", self.base_url, PROFILE_PATH));
        let response: ApiResponse<Profile> = self.send(request).await?;
        if !response.status {
            return Err(BrokerError::BadResponse(response.describe_error()));
        }

        let profile = response
            .data
            .ok_or_else(|| BrokerError::BadResponse("profile payload missing".to_string()))?;
        if profile.clientcode != client_id {
            warn!(
                "Session belongs to {} but ANGELONE_CLIENT_ID is {}",
                profile.clientcode, client_id
            );
        }

        self.connected = true;
        info!("Angel One session active for {}", profile.clientcode);
        Ok(())
    }

    /// SmartAPI quotes by instrument token, so the configured spot instrument
    /// stands in for `symbol`.
    async fn get_price(&mut self, symbol: &str) -> Result<f64, BrokerError> {
        self.ensure_connected()?;
        debug!("Fetching {} via {}", symbol, self.contracts.spot.tradingsymbol);
        self.ltp(&self.contracts.spot).await
    }

    async fn place_order(&mut self, request: &OrderRequest) -> Result<OrderResponse, BrokerError> {
        self.ensure_connected()?;

        let contract = self
            .contracts
            .for_side(request.option)
            .ok_or(BrokerError::NoContract(request.option))?;

        // Market order: the quote just before submission is the best fill estimate
        let premium = self.ltp(contract).await?;
        let quantity = request.lots.saturating_mul(self.lot_size);

        let body = PlaceOrderRequest::market(contract, &request.side.to_string(), quantity);
        info!(
            "Placing {} {} x{} on {}",
            request.side, contract.tradingsymbol, quantity, contract.exchange
        );

        let response: ApiResponse<PlaceOrderData> = self.post(PLACE_ORDER_PATH, &body).await?;
        if !response.status {
            return Ok(OrderResponse::Rejected {
                error: response.describe_error(),
            });
        }

        let data = response
            .data
            .ok_or_else(|| BrokerError::BadResponse("order payload missing".to_string()))?;

        Ok(OrderResponse::Executed(OrderFill {
            order_id: data.orderid,
            entry_cost: premium * quantity as f64,
            entry_premium: premium,
        }))
    }
}
