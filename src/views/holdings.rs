//! Holdings view

use crate::brokers::types::{Holding, Instrument};
use crate::error::{AppError, Result};
use crate::scheduler::RefreshScheduler;
use crate::services::{
    ImportResult, ImportService, PersistenceBackend, PortfolioService, PortfolioSummary,
    QuotesService,
};
use crate::views::RefreshBinding;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

pub const HOLDINGS_TASK_ID: &str = "holdings";

/// Everything the refresh task needs, detached from the view itself
#[derive(Clone)]
struct HoldingsRefresher {
    quotes: Arc<QuotesService>,
    backend: Arc<dyn PersistenceBackend>,
    holdings: Arc<RwLock<Vec<Holding>>>,
}

impl HoldingsRefresher {
    async fn run(self) -> Result<()> {
        let instruments: Vec<Instrument> =
            self.holdings.read().iter().map(Holding::instrument).collect();
        if instruments.is_empty() {
            return Ok(());
        }

        let quotes = self.quotes.fetch(&instruments).await?;

        let snapshot = {
            let mut holdings = self.holdings.write();
            let updated = PortfolioService::merge_holding_quotes(&mut holdings, &quotes);
            debug!("Updated prices for {} of {} holdings", updated, holdings.len());
            holdings.clone()
        };

        if let Err(e) = self.backend.save_holdings(&snapshot).await {
            warn!("Failed to persist refreshed holdings: {}", e);
        }
        Ok(())
    }
}

/// Holdings view state
pub struct HoldingsView {
    refresher: HoldingsRefresher,
    binding: RefreshBinding,
}

impl HoldingsView {
    pub fn new(
        scheduler: Arc<RefreshScheduler>,
        quotes: Arc<QuotesService>,
        backend: Arc<dyn PersistenceBackend>,
    ) -> Self {
        Self {
            refresher: HoldingsRefresher {
                quotes,
                backend,
                holdings: Arc::new(RwLock::new(Vec::new())),
            },
            binding: RefreshBinding::new(HOLDINGS_TASK_ID, scheduler),
        }
    }

    pub fn mount(&self) {
        self.binding.set_mounted(true);
        self.sync_refresh();
    }

    pub fn unmount(&self) {
        self.binding.set_mounted(false);
        self.sync_refresh();
    }

    pub fn is_refresh_registered(&self) -> bool {
        self.binding.is_registered()
    }

    pub fn holdings(&self) -> Vec<Holding> {
        self.refresher.holdings.read().clone()
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioService::summarize(&self.refresher.holdings.read())
    }

    /// Load holdings from the backend, replacing the current list
    pub async fn load(&self) -> Result<usize> {
        let holdings = self.refresher.backend.load_holdings().await?;
        let count = holdings.len();
        *self.refresher.holdings.write() = holdings;
        self.sync_refresh();
        Ok(count)
    }

    pub async fn add_holding(&self, holding: Holding) -> Result<()> {
        if !(holding.quantity > 0.0) {
            return Err(AppError::Validation(format!(
                "Quantity for {} must be positive",
                holding.symbol
            )));
        }
        if !(holding.average_price >= 0.0) {
            return Err(AppError::Validation(format!(
                "Average price for {} cannot be negative",
                holding.symbol
            )));
        }

        self.refresher.holdings.write().push(holding);
        self.persist_and_sync().await
    }

    pub async fn remove_holding(&self, id: &str) -> Result<()> {
        {
            let mut holdings = self.refresher.holdings.write();
            let before = holdings.len();
            holdings.retain(|h| h.id != id);
            if holdings.len() == before {
                return Err(AppError::NotFound(format!("Holding {}", id)));
            }
        }
        self.persist_and_sync().await
    }

    /// Append the valid rows of a holdings CSV
    pub async fn import_csv(&self, csv_data: &str) -> Result<ImportResult> {
        let result = ImportService::parse_holdings_csv(csv_data)?;
        if !result.holdings.is_empty() {
            self.refresher
                .holdings
                .write()
                .extend(result.holdings.iter().cloned());
            self.persist_and_sync().await?;
        }
        Ok(result)
    }

    /// Refresh prices now, outside the timer
    pub async fn refresh(&self) -> Result<()> {
        self.refresher.clone().run().await
    }

    async fn persist_and_sync(&self) -> Result<()> {
        self.sync_refresh();
        let snapshot = self.holdings();
        self.refresher.backend.save_holdings(&snapshot).await
    }

    fn sync_refresh(&self) {
        let has_items = !self.refresher.holdings.read().is_empty();
        let refresher = self.refresher.clone();
        self.binding
            .sync(has_items, move || refresher.clone().run());
    }
}
