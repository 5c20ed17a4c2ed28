//! Application state management

use crate::brokers::{HttpQuoteProvider, QuoteProvider};
use crate::config::AppConfig;
use crate::db::sqlite::SqliteDb;
use crate::db::KeyValueStore;
use crate::error::Result;
use crate::scheduler::RefreshScheduler;
use crate::services::{
    FallbackBackend, HttpBackend, LocalBackend, PersistenceBackend, PortfolioSummary,
    QuotesService,
};
use crate::views::{HoldingsView, WatchlistView};
use std::sync::Arc;

/// Application state shared by the entry point and the views
pub struct AppState {
    pub config: AppConfig,

    /// SQLite database: settings slots and local portfolio copies
    pub sqlite: Arc<SqliteDb>,

    /// Auto-refresh scheduler
    pub scheduler: Arc<RefreshScheduler>,

    pub quotes: Arc<QuotesService>,

    pub backend: Arc<dyn PersistenceBackend>,

    pub holdings: HoldingsView,

    pub watchlist: WatchlistView,
}

impl AppState {
    /// Create application state with the HTTP quote provider from `config`.
    /// Must be called inside a Tokio runtime.
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = Arc::new(HttpQuoteProvider::new(
            &config.quote_url,
            config.quote_api_key.clone(),
            config.access_token.clone(),
            config.http_timeout,
        )?);
        Self::with_provider(config, provider)
    }

    /// Create application state around an existing quote provider
    pub fn with_provider(config: AppConfig, provider: Arc<dyn QuoteProvider>) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        tracing::info!("Data directory: {:?}", config.data_dir);

        let sqlite = Arc::new(SqliteDb::new(&config.database_path())?);

        let store: Arc<dyn KeyValueStore> = sqlite.clone();
        let scheduler = Arc::new(RefreshScheduler::new(store)?);

        let remote: Option<Box<dyn PersistenceBackend>> = match &config.backend_url {
            Some(url) => {
                tracing::info!("Persistence backend: {}", url);
                Some(Box::new(HttpBackend::new(url, config.http_timeout)?))
            }
            None => {
                tracing::info!("No persistence backend configured, storing locally");
                None
            }
        };
        let backend: Arc<dyn PersistenceBackend> = Arc::new(FallbackBackend::new(
            remote,
            LocalBackend::new(sqlite.clone()),
        ));

        let quotes = Arc::new(QuotesService::new(provider));

        let holdings = HoldingsView::new(scheduler.clone(), quotes.clone(), backend.clone());
        let watchlist = WatchlistView::new(scheduler.clone(), quotes.clone(), backend.clone());

        Ok(Self {
            config,
            sqlite,
            scheduler,
            quotes,
            backend,
            holdings,
            watchlist,
        })
    }

    pub fn summary(&self) -> PortfolioSummary {
        self.holdings.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brokers::types::Holding;
    use crate::scheduler::RefreshSettingsUpdate;
    use crate::services::quotes_service::tests::StaticProvider;

    fn config(dir: &std::path::Path) -> AppConfig {
        let data_dir = dir.to_string_lossy().to_string();
        AppConfig::from_lookup(move |key| match key {
            "PORTFOLIO_DATA_DIR" => Some(data_dir.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_persists_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(StaticProvider::default());

        {
            let state = AppState::with_provider(config(dir.path()), provider.clone()).unwrap();
            state
                .scheduler
                .update_settings(RefreshSettingsUpdate {
                    enabled: Some(true),
                    interval_seconds: Some(30),
                })
                .unwrap();
            state
                .holdings
                .add_holding(Holding::new("NSE", "SBIN", 3.0, 600.0))
                .await
                .unwrap();
        }

        let state = AppState::with_provider(config(dir.path()), provider).unwrap();
        assert!(state.scheduler.is_enabled());
        assert_eq!(state.scheduler.get_interval(), 30);
        assert_eq!(state.holdings.load().await.unwrap(), 1);
        assert_eq!(state.summary().total_invested, 1800.0);
    }
}
