//! Portfolio Service
//!
//! P&L and aggregate metrics for holdings, and merging of fresh quotes
//! into holdings and watchlist items.

use crate::brokers::types::{Holding, Quote, WatchlistItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived values for one holding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingMetrics {
    pub invested_value: f64,
    pub current_value: f64,
    pub pnl: f64,
    pub pnl_percentage: f64,
    pub day_change: f64,
}

/// Aggregate portfolio metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub holdings_count: usize,
    pub total_invested: f64,
    pub current_value: f64,
    pub total_pnl: f64,
    pub total_pnl_percentage: f64,
    pub day_change: f64,
    pub day_change_percentage: f64,
    pub gainers: usize,
    pub losers: usize,
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Portfolio calculations
pub struct PortfolioService;

impl PortfolioService {
    pub fn metrics(holding: &Holding) -> HoldingMetrics {
        let invested_value = holding.quantity * holding.average_price;
        let current_value = holding.quantity * holding.ltp;
        let pnl = current_value - invested_value;

        HoldingMetrics {
            invested_value,
            current_value,
            pnl,
            pnl_percentage: percentage(pnl, invested_value),
            day_change: holding.quantity * (holding.ltp - holding.prev_close),
        }
    }

    pub fn summarize(holdings: &[Holding]) -> PortfolioSummary {
        let mut summary = PortfolioSummary {
            holdings_count: holdings.len(),
            ..PortfolioSummary::default()
        };

        for holding in holdings {
            let m = Self::metrics(holding);
            summary.total_invested += m.invested_value;
            summary.current_value += m.current_value;
            summary.total_pnl += m.pnl;
            summary.day_change += m.day_change;

            if m.pnl > 0.0 {
                summary.gainers += 1;
            } else if m.pnl < 0.0 {
                summary.losers += 1;
            }
        }

        summary.total_pnl_percentage = percentage(summary.total_pnl, summary.total_invested);
        let previous_value = summary.current_value - summary.day_change;
        summary.day_change_percentage = percentage(summary.day_change, previous_value);
        summary
    }

    pub fn apply_quote_to_holding(holding: &mut Holding, quote: &Quote) {
        holding.ltp = quote.ltp;
        if quote.close > 0.0 {
            holding.prev_close = quote.close;
        }
        holding.last_updated = Some(quote.timestamp);
    }

    pub fn apply_quote_to_watchlist(item: &mut WatchlistItem, quote: &Quote) {
        item.ltp = quote.ltp;
        item.change = quote.change;
        item.change_percent = quote.change_percent;
        item.last_updated = Some(quote.timestamp);
    }

    /// Merge quotes into holdings by instrument key; returns how many were
    /// updated
    pub fn merge_holding_quotes(holdings: &mut [Holding], quotes: &[Quote]) -> usize {
        let by_key = index(quotes);
        let mut updated = 0;
        for holding in holdings.iter_mut() {
            if let Some(quote) = by_key.get(&holding.instrument().key()) {
                Self::apply_quote_to_holding(holding, quote);
                updated += 1;
            }
        }
        updated
    }

    /// Merge quotes into watchlist items by instrument key; returns how many
    /// were updated
    pub fn merge_watchlist_quotes(items: &mut [WatchlistItem], quotes: &[Quote]) -> usize {
        let by_key = index(quotes);
        let mut updated = 0;
        for item in items.iter_mut() {
            if let Some(quote) = by_key.get(&item.instrument().key()) {
                Self::apply_quote_to_watchlist(item, quote);
                updated += 1;
            }
        }
        updated
    }
}

fn index(quotes: &[Quote]) -> HashMap<String, &Quote> {
    quotes.iter().map(|q| (q.key(), q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn holding(symbol: &str, qty: f64, avg: f64, ltp: f64, prev_close: f64) -> Holding {
        let mut h = Holding::new("NSE", symbol, qty, avg);
        h.ltp = ltp;
        h.prev_close = prev_close;
        h
    }

    fn quote(symbol: &str, ltp: f64, close: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            ltp,
            open: close,
            high: ltp,
            low: close,
            close,
            change: ltp - close,
            change_percent: (ltp - close) / close * 100.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_holding_metrics() {
        let m = PortfolioService::metrics(&holding("SBIN", 10.0, 500.0, 550.0, 540.0));
        assert_eq!(m.invested_value, 5000.0);
        assert_eq!(m.current_value, 5500.0);
        assert_eq!(m.pnl, 500.0);
        assert_eq!(m.pnl_percentage, 10.0);
        assert_eq!(m.day_change, 100.0);
    }

    #[test]
    fn test_zero_cost_holding_has_zero_percentage() {
        let m = PortfolioService::metrics(&holding("BONUS", 5.0, 0.0, 100.0, 100.0));
        assert_eq!(m.pnl, 500.0);
        assert_eq!(m.pnl_percentage, 0.0);
    }

    #[test]
    fn test_summary() {
        let holdings = vec![
            holding("SBIN", 10.0, 500.0, 550.0, 540.0),
            holding("TCS", 2.0, 4000.0, 3800.0, 3850.0),
            holding("ITC", 1.0, 400.0, 400.0, 400.0),
        ];
        let s = PortfolioService::summarize(&holdings);

        assert_eq!(s.holdings_count, 3);
        assert_eq!(s.total_invested, 13400.0);
        assert_eq!(s.current_value, 13500.0);
        assert_eq!(s.total_pnl, 100.0);
        assert!((s.total_pnl_percentage - 0.746268).abs() < 1e-5);
        assert_eq!(s.day_change, 0.0);
        assert_eq!(s.gainers, 1);
        assert_eq!(s.losers, 1);

        assert_eq!(PortfolioService::summarize(&[]), PortfolioSummary::default());
    }

    #[test]
    fn test_merge_quotes() {
        let mut holdings = vec![
            holding("SBIN", 10.0, 500.0, 500.0, 500.0),
            holding("TCS", 1.0, 3500.0, 3500.0, 3500.0),
        ];
        let quotes = vec![quote("SBIN", 610.0, 600.0)];

        assert_eq!(PortfolioService::merge_holding_quotes(&mut holdings, &quotes), 1);
        assert_eq!(holdings[0].ltp, 610.0);
        assert_eq!(holdings[0].prev_close, 600.0);
        assert!(holdings[0].last_updated.is_some());
        assert_eq!(holdings[1].ltp, 3500.0);
        assert!(holdings[1].last_updated.is_none());

        let mut items = vec![WatchlistItem::new("NSE", "SBIN")];
        assert_eq!(PortfolioService::merge_watchlist_quotes(&mut items, &quotes), 1);
        assert_eq!(items[0].change, 10.0);
    }
}
