//! Angel One SmartAPI Data Models
//!
//! Request and response types for the SmartAPI REST endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Envelope
// ============================================================================

/// Every SmartAPI response is wrapped in this envelope
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub status: bool,
    /// Human-readable outcome ("SUCCESS" or an error message)
    #[serde(default)]
    pub message: String,
    /// Error code such as "AB1010" when `status` is false
    #[serde(default)]
    pub errorcode: String,
    /// Payload; failures send `null` or `""`
    #[serde(default, deserialize_with = "empty_as_none")]
    pub data: Option<T>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl<T> ApiResponse<T> {
    /// Message suitable for logs, including the error code when present
    pub fn describe_error(&self) -> String {
        if self.errorcode.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, self.errorcode)
        }
    }
}

// ============================================================================
// Instruments
// ============================================================================

/// A tradable instrument as SmartAPI identifies it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Exchange segment ("NSE", "NFO")
    pub exchange: String,
    /// Trading symbol (e.g., "Nifty 50", "NIFTY30JAN2523000CE")
    pub tradingsymbol: String,
    /// Numeric instrument token from the scrip master
    pub symboltoken: String,
}

impl Instrument {
    pub fn new(exchange: &str, tradingsymbol: &str, symboltoken: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            tradingsymbol: tradingsymbol.to_string(),
            symboltoken: symboltoken.to_string(),
        }
    }

    /// NIFTY 50 index on the cash segment
    pub fn nifty_spot() -> Self {
        Self::new("NSE", "Nifty 50", "99926000")
    }
}

// ============================================================================
// Market data
// ============================================================================

/// Payload of `getLtpData`
#[derive(Debug, Deserialize)]
pub struct LtpData {
    pub exchange: String,
    pub tradingsymbol: String,
    pub symboltoken: String,
    /// Last traded price
    pub ltp: f64,
}

// ============================================================================
// Orders
// ============================================================================

/// Body of `placeOrder`
#[derive(Debug, Serialize)]
pub struct PlaceOrderRequest {
    /// "NORMAL" for regular orders
    pub variety: String,
    pub tradingsymbol: String,
    pub symboltoken: String,
    /// "BUY" or "SELL"
    pub transactiontype: String,
    pub exchange: String,
    /// "MARKET" or "LIMIT"
    pub ordertype: String,
    /// "INTRADAY", "CARRYFORWARD", ...
    pub producttype: String,
    /// "DAY" or "IOC"
    pub duration: String,
    /// Quantity in units (lots * lot size), sent as a string
    pub quantity: String,
    pub price: String,
}

impl PlaceOrderRequest {
    /// Intraday market order for `quantity` units
    pub fn market(instrument: &Instrument, transaction_type: &str, quantity: u32) -> Self {
        Self {
            variety: "NORMAL".to_string(),
            tradingsymbol: instrument.tradingsymbol.clone(),
            symboltoken: instrument.symboltoken.clone(),
            transactiontype: transaction_type.to_string(),
            exchange: instrument.exchange.clone(),
            ordertype: "MARKET".to_string(),
            producttype: "INTRADAY".to_string(),
            duration: "DAY".to_string(),
            quantity: quantity.to_string(),
            price: "0".to_string(),
        }
    }
}

/// Payload of `placeOrder`
#[derive(Debug, Deserialize)]
pub struct PlaceOrderData {
    /// Broker order id
    pub orderid: String,
    #[serde(default)]
    pub script: Option<String>,
}

// ============================================================================
// Session
// ============================================================================

/// Payload of `getProfile`
#[derive(Debug, Deserialize)]
pub struct Profile {
    pub clientcode: String,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ltp_response() {
        let body = r#"{
            "status": true,
            "message": "SUCCESS",
            "errorcode": "",
            "data": {
                "exchange": "NSE",
                "tradingsymbol": "Nifty 50",
                "symboltoken": "99926000",
                "open": 23010.5,
                "high": 23120.0,
                "low": 22980.25,
                "close": 23001.0,
                "ltp": 23055.4
            }
        }"#;

        let response: ApiResponse<LtpData> = serde_json::from_str(body).unwrap();
        assert!(response.status);
        assert_eq!(response.data.unwrap().ltp, 23055.4);
    }

    #[test]
    fn test_parse_failure_with_empty_data() {
        let body = r#"{
            "status": false,
            "message": "Invalid Token",
            "errorcode": "AG8001",
            "data": ""
        }"#;

        let response: ApiResponse<PlaceOrderData> = serde_json::from_str(body).unwrap();
        assert!(!response.status);
        assert!(response.data.is_none());
        assert_eq!(response.describe_error(), "Invalid Token (AG8001)");
    }

    #[test]
    fn test_market_order_body() {
        let instrument = Instrument::new("NFO", "NIFTY30JAN2523000CE", "43650");
        let body = serde_json::to_value(PlaceOrderRequest::market(&instrument, "BUY", 100)).unwrap();

        assert_eq!(body["variety"], "NORMAL");
        assert_eq!(body["transactiontype"], "BUY");
        assert_eq!(body["exchange"], "NFO");
        assert_eq!(body["ordertype"], "MARKET");
        assert_eq!(body["quantity"], "100");
    }
}
