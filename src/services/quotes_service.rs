//! Quotes Service
//!
//! Fetches quotes from the configured provider and keeps the last quote
//! seen for every instrument, shared by the holdings and watchlist views.

use crate::brokers::types::{Instrument, Quote};
use crate::brokers::QuoteProvider;
use crate::error::Result;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Quotes service with a last-quote cache
pub struct QuotesService {
    provider: Arc<dyn QuoteProvider>,
    cache: DashMap<String, Quote>,
}

impl QuotesService {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
        }
    }

    /// Fetch quotes for `instruments` in one batch. Duplicates are requested
    /// once.
    pub async fn fetch(&self, instruments: &[Instrument]) -> Result<Vec<Quote>> {
        let mut seen = HashSet::new();
        let unique: Vec<Instrument> = instruments
            .iter()
            .filter(|inst| seen.insert(inst.key()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(vec![]);
        }

        info!(
            "QuotesService::fetch - {} instruments via {}",
            unique.len(),
            self.provider.id()
        );

        let quotes = self.provider.get_quotes(&unique).await?;
        for quote in &quotes {
            self.cache.insert(quote.key(), quote.clone());
        }

        if quotes.len() < unique.len() {
            debug!("{} instruments returned no quote", unique.len() - quotes.len());
        }

        Ok(quotes)
    }

    /// Last quote seen for a provider key such as `NSE:SBIN`
    pub fn cached(&self, key: &str) -> Option<Quote> {
        self.cache.get(key).map(|q| q.clone())
    }
}
