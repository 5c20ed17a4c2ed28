//! Quote provider adapters

pub mod types;
pub mod http;

use crate::error::Result;
use async_trait::async_trait;
use types::*;

pub use http::HttpQuoteProvider;

/// Source of live prices. Implementations must return quotes only for the
/// instruments they could price; missing instruments are not an error.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider ID (e.g., "kite")
    fn id(&self) -> &'static str;

    /// Get quotes for a batch of instruments
    async fn get_quotes(&self, instruments: &[Instrument]) -> Result<Vec<Quote>>;
}
