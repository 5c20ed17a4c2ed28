//! REST quote provider
//!
//! Batch endpoint: `GET {base}/quotes?symbols=NSE:SBIN,NSE:TCS`, answering
//! `{"status": "success", "data": {"NSE:SBIN": {...}}}`.

use crate::brokers::types::{Instrument, Quote};
use crate::brokers::QuoteProvider;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<HashMap<String, QuoteData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    last_price: f64,
    #[serde(default)]
    net_change: Option<f64>,
    #[serde(default)]
    ohlc: Option<Ohlc>,
}

#[derive(Debug, Default, Deserialize)]
struct Ohlc {
    #[serde(default)]
    open: f64,
    #[serde(default)]
    high: f64,
    #[serde(default)]
    low: f64,
    #[serde(default)]
    close: f64,
}

/// HTTP quote provider
pub struct HttpQuoteProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl HttpQuoteProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token,
        })
    }

    fn get_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        if let (Some(key), Some(token)) = (&self.api_key, &self.access_token) {
            if let Ok(value) = format!("token {}:{}", key, token).parse() {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }

        headers
    }

    fn quotes_url(&self, instruments: &[Instrument]) -> Result<url::Url> {
        let symbols: Vec<String> = instruments.iter().map(Instrument::key).collect();
        let raw = format!(
            "{}/quotes?symbols={}",
            self.base_url,
            urlencoding::encode(&symbols.join(","))
        );
        Ok(url::Url::parse(&raw)?)
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    fn id(&self) -> &'static str {
        "http"
    }

    async fn get_quotes(&self, instruments: &[Instrument]) -> Result<Vec<Quote>> {
        if instruments.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .get(self.quotes_url(instruments)?)
            .headers(self.get_headers())
            .send()
            .await?
            .error_for_status()?;

        let result: QuotesResponse = response.json().await?;
        parse_quotes(result)
    }
}

fn parse_quotes(result: QuotesResponse) -> Result<Vec<Quote>> {
    if result.status != "success" {
        return Err(AppError::Quote(
            result
                .message
                .unwrap_or_else(|| "Failed to fetch quotes".to_string()),
        ));
    }

    let now = chrono::Utc::now();
    let mut quotes: Vec<Quote> = result
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, data)| {
            let instrument = Instrument::from_key(&key);
            let ohlc = data.ohlc.unwrap_or_default();
            let change = data
                .net_change
                .unwrap_or(if ohlc.close > 0.0 { data.last_price - ohlc.close } else { 0.0 });
            let change_percent = if ohlc.close > 0.0 {
                change / ohlc.close * 100.0
            } else {
                0.0
            };

            Quote {
                symbol: instrument.symbol,
                exchange: instrument.exchange,
                ltp: data.last_price,
                open: ohlc.open,
                high: ohlc.high,
                low: ohlc.low,
                close: ohlc.close,
                change,
                change_percent,
                timestamp: now,
            }
        })
        .collect();

    quotes.sort_by(|a, b| a.key().cmp(&b.key()));
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HttpQuoteProvider {
        HttpQuoteProvider::new("https://quotes.example.com/", None, None, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_quotes_url_encodes_batch() {
        let url = provider()
            .quotes_url(&[Instrument::new("NSE", "SBIN"), Instrument::new("BSE", "M&M")])
            .unwrap();
        assert_eq!(url.path(), "/quotes");
        let (_, symbols) = url.query_pairs().next().unwrap();
        assert_eq!(symbols, "NSE:SBIN,BSE:M&M");
    }

    #[test]
    fn test_parse_quotes() {
        let body = r#"{
            "status": "success",
            "data": {
                "NSE:TCS": {"last_price": 3900.0, "ohlc": {"open": 3850, "high": 3910, "low": 3840, "close": 3800}},
                "NSE:SBIN": {"last_price": 610.5, "net_change": -4.5, "ohlc": {"close": 615.0}}
            }
        }"#;
        let quotes = parse_quotes(serde_json::from_str(body).unwrap()).unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol, "SBIN");
        assert_eq!(quotes[0].change, -4.5);
        assert_eq!(quotes[1].symbol, "TCS");
        assert_eq!(quotes[1].change, 100.0);
        assert!((quotes[1].change_percent - 2.631578).abs() < 1e-4);
    }

    #[test]
    fn test_parse_quotes_error_status() {
        let body = r#"{"status": "error", "message": "Invalid token"}"#;
        let err = parse_quotes(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Quote(ref m) if m == "Invalid token"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let quotes = provider().get_quotes(&[]).await.unwrap();
        assert!(quotes.is_empty());
    }
}
