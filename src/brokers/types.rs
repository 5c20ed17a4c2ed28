//! Common market and portfolio types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_EXCHANGE: &str = "NSE";

/// Tradable instrument identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub exchange: String,
    pub symbol: String,
}

impl Instrument {
    pub fn new(exchange: &str, symbol: &str) -> Self {
        let exchange = exchange.trim();
        Self {
            exchange: if exchange.is_empty() {
                DEFAULT_EXCHANGE.to_string()
            } else {
                exchange.to_uppercase()
            },
            symbol: symbol.trim().to_uppercase(),
        }
    }

    /// Provider key, e.g. `NSE:RELIANCE`
    pub fn key(&self) -> String {
        format!("{}:{}", self.exchange, self.symbol)
    }

    /// Parse a provider key. A bare symbol defaults to NSE.
    pub fn from_key(key: &str) -> Self {
        match key.split_once(':') {
            Some((exchange, symbol)) => Self::new(exchange, symbol),
            None => Self::new(DEFAULT_EXCHANGE, key),
        }
    }
}

/// Quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub exchange: String,
    pub ltp: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Previous session close
    pub close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn key(&self) -> String {
        format!("{}:{}", self.exchange, self.symbol)
    }
}

/// Owned position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub quantity: f64,
    pub average_price: f64,
    pub ltp: f64,
    pub prev_close: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Holding {
    /// New holding priced at its average cost until the first quote arrives
    pub fn new(exchange: &str, symbol: &str, quantity: f64, average_price: f64) -> Self {
        let instrument = Instrument::new(exchange, symbol);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: instrument.symbol,
            exchange: instrument.exchange,
            quantity,
            average_price,
            ltp: average_price,
            prev_close: average_price,
            last_updated: None,
        }
    }

    pub fn instrument(&self) -> Instrument {
        Instrument::new(&self.exchange, &self.symbol)
    }
}

/// Tracked symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub ltp: f64,
    pub change: f64,
    pub change_percent: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl WatchlistItem {
    pub fn new(exchange: &str, symbol: &str) -> Self {
        let instrument = Instrument::new(exchange, symbol);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: instrument.symbol,
            exchange: instrument.exchange,
            ltp: 0.0,
            change: 0.0,
            change_percent: 0.0,
            last_updated: None,
        }
    }

    pub fn instrument(&self) -> Instrument {
        Instrument::new(&self.exchange, &self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_normalization() {
        let inst = Instrument::new(" nse ", " reliance");
        assert_eq!(inst.key(), "NSE:RELIANCE");

        assert_eq!(Instrument::new("", "tcs").exchange, "NSE");
        assert_eq!(Instrument::from_key("BSE:INFY"), Instrument::new("BSE", "INFY"));
        assert_eq!(Instrument::from_key("infy").key(), "NSE:INFY");
    }

    #[test]
    fn test_new_holding_priced_at_cost() {
        let holding = Holding::new("nse", "sbin", 10.0, 500.0);
        assert_eq!(holding.symbol, "SBIN");
        assert_eq!(holding.ltp, 500.0);
        assert!(holding.last_updated.is_none());
        assert!(!holding.id.is_empty());
    }
}
