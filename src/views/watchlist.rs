//! Watchlist view

use crate::brokers::types::{Instrument, WatchlistItem};
use crate::error::{AppError, Result};
use crate::scheduler::RefreshScheduler;
use crate::services::{PersistenceBackend, PortfolioService, QuotesService};
use crate::views::RefreshBinding;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

pub const WATCHLIST_TASK_ID: &str = "watchlist";

#[derive(Clone)]
struct WatchlistRefresher {
    quotes: Arc<QuotesService>,
    backend: Arc<dyn PersistenceBackend>,
    items: Arc<RwLock<Vec<WatchlistItem>>>,
}

impl WatchlistRefresher {
    async fn run(self) -> Result<()> {
        let instruments: Vec<Instrument> =
            self.items.read().iter().map(WatchlistItem::instrument).collect();
        if instruments.is_empty() {
            return Ok(());
        }

        let quotes = self.quotes.fetch(&instruments).await?;

        let snapshot = {
            let mut items = self.items.write();
            let updated = PortfolioService::merge_watchlist_quotes(&mut items, &quotes);
            debug!("Updated prices for {} of {} watchlist items", updated, items.len());
            items.clone()
        };

        if let Err(e) = self.backend.save_watchlist(&snapshot).await {
            warn!("Failed to persist refreshed watchlist: {}", e);
        }
        Ok(())
    }
}

/// Watchlist view state
pub struct WatchlistView {
    refresher: WatchlistRefresher,
    binding: RefreshBinding,
}

impl WatchlistView {
    pub fn new(
        scheduler: Arc<RefreshScheduler>,
        quotes: Arc<QuotesService>,
        backend: Arc<dyn PersistenceBackend>,
    ) -> Self {
        Self {
            refresher: WatchlistRefresher {
                quotes,
                backend,
                items: Arc::new(RwLock::new(Vec::new())),
            },
            binding: RefreshBinding::new(WATCHLIST_TASK_ID, scheduler),
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

    pub fn items(&self) -> Vec<WatchlistItem> {
        self.refresher.items.read().clone()
    }

    pub async fn load(&self) -> Result<usize> {
        let items = self.refresher.backend.load_watchlist().await?;
        let count = items.len();
        *self.refresher.items.write() = items;
        self.sync_refresh();
        Ok(count)
    }

    /// Start tracking a symbol. Each instrument can be tracked once.
    pub async fn add_symbol(&self, exchange: &str, symbol: &str) -> Result<WatchlistItem> {
        let item = WatchlistItem::new(exchange, symbol);
        if item.symbol.is_empty() {
            return Err(AppError::Validation("Symbol is required".to_string()));
        }

        {
            let mut items = self.refresher.items.write();
            let key = item.instrument().key();
            if items.iter().any(|i| i.instrument().key() == key) {
                return Err(AppError::Validation(format!("{} is already on the watchlist", key)));
            }
            items.push(item.clone());
        }

        self.persist_and_sync().await?;
        Ok(item)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        {
            let mut items = self.refresher.items.write();
            let before = items.len();
            items.retain(|i| i.id != id);
            if items.len() == before {
                return Err(AppError::NotFound(format!("Watchlist item {}", id)));
            }
        }
        self.persist_and_sync().await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.refresher.clone().run().await
    }

    async fn persist_and_sync(&self) -> Result<()> {
        self.sync_refresh();
        let snapshot = self.items();
        self.refresher.backend.save_watchlist(&snapshot).await
    }

    fn sync_refresh(&self) {
        let has_items = !self.refresher.items.read().is_empty();
        let refresher = self.refresher.clone();
        self.binding
            .sync(has_items, move || refresher.clone().run());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteDb};
    use crate::services::quotes_service::tests::StaticProvider;
    use crate::services::{FallbackBackend, LocalBackend};
    use std::time::Duration;

    fn make_view(
        scheduler: &Arc<RefreshScheduler>,
        provider: &Arc<StaticProvider>,
    ) -> (WatchlistView, Arc<SqliteDb>) {
        let db = Arc::new(SqliteDb::in_memory().unwrap());
        let view = WatchlistView::new(
            scheduler.clone(),
            Arc::new(QuotesService::new(provider.clone())),
            Arc::new(FallbackBackend::local_only(LocalBackend::new(db.clone()))),
        );
        (view, db)
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates_and_blank() {
        let scheduler = Arc::new(RefreshScheduler::new(Arc::new(MemoryStore::new())).unwrap());
        let provider = Arc::new(StaticProvider::default());
        let (view, db) = make_view(&scheduler, &provider);

        view.add_symbol("NSE", "infy").await.unwrap();
        assert!(matches!(
            view.add_symbol("nse", "INFY").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(view.add_symbol("NSE", "  ").await, Err(AppError::Validation(_))));

        assert_eq!(db.load_watchlist().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retries_on_next_tick() {
        let scheduler = Arc::new(RefreshScheduler::new(Arc::new(MemoryStore::new())).unwrap());
        let provider = Arc::new(StaticProvider::with_prices(&[("NSE:INFY", 1500.0, 1480.0)]));
        let (view, _db) = make_view(&scheduler, &provider);

        view.mount();
        let item = view.add_symbol("NSE", "INFY").await.unwrap();
        scheduler.toggle();

        *provider.fail.lock() = true;
        tokio::time::sleep(Duration::from_millis(10_001)).await;
        assert_eq!(view.items()[0].ltp, 0.0);

        *provider.fail.lock() = false;
        tokio::time::sleep(Duration::from_millis(10_001)).await;
        let items = view.items();
        assert_eq!(items[0].ltp, 1500.0);
        assert_eq!(items[0].change, 20.0);
        assert_eq!(provider.calls.lock().len(), 2);

        view.remove(&item.id).await.unwrap();
        assert!(!view.is_refresh_registered());
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let scheduler = Arc::new(RefreshScheduler::new(Arc::new(MemoryStore::new())).unwrap());
        let provider = Arc::new(StaticProvider::default());

        {
            let (view, _db) = make_view(&scheduler, &provider);
            view.mount();
            view.add_symbol("BSE", "ITC").await.unwrap();
            assert_eq!(scheduler.registered_tasks(), vec![WATCHLIST_TASK_ID.to_string()]);
        }

        assert!(scheduler.registered_tasks().is_empty());
    }
}
