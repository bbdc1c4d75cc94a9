//! Angel One SmartAPI Integration
//!
//! Real broker adapter for NIFTY options through the SmartAPI REST API.
//!
//! # Components
//!
//! - [`client`] - gateway implementing `BrokerGateway` over reqwest
//! - [`models`] - request/response data types
//!
//! # Environment Variables
//!
//! - `ANGELONE_API_KEY` - SmartAPI app key
//! - `ANGELONE_CLIENT_ID` - Angel One client code
//! - `ANGELONE_ACCESS_TOKEN` - session JWT from a prior login
//! - `ANGELONE_CE_SYMBOL` / `ANGELONE_CE_TOKEN` - call contract to buy
//! - `ANGELONE_PE_SYMBOL` / `ANGELONE_PE_TOKEN` - put contract to buy
//!
//! Without credentials the gateway still constructs, but every call fails and
//! the agent simply skips its entry for that cycle.
//!
//! # API Endpoints Used
//!
//! - `GET /rest/secure/angelbroking/user/v1/getProfile` - Session check
//! - `POST /rest/secure/angelbroking/order/v1/getLtpData` - Last traded price
//! - `POST /rest/secure/angelbroking/order/v1/placeOrder` - Place orders

pub mod client;
pub mod models;

pub use client::{AngelOneCredentials, AngelOneGateway, ContractBook};
pub use models::Instrument;
