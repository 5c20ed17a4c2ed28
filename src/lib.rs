//! Portfolio Tracker
//!
//! Tracks holdings and watchlists, computes P&L and keeps prices fresh
//! through a periodic auto-refresh scheduler.

pub mod brokers;
pub mod config;
pub mod db;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod views;

use config::AppConfig;
use error::Result;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run until Ctrl-C: load the portfolio, mount both views and let the
/// scheduler refresh prices
pub async fn run(config: AppConfig) -> Result<()> {
    tracing::info!("Starting Portfolio Tracker...");

    let state = AppState::new(config)?;

    match state.holdings.load().await {
        Ok(count) => tracing::info!("Loaded {} holdings", count),
        Err(e) => tracing::warn!("Failed to load holdings: {}", e),
    }
    match state.watchlist.load().await {
        Ok(count) => tracing::info!("Loaded {} watchlist items", count),
        Err(e) => tracing::warn!("Failed to load watchlist: {}", e),
    }

    state.holdings.mount();
    state.watchlist.mount();

    if let Err(e) = state.holdings.refresh().await {
        tracing::warn!("Initial holdings refresh failed: {}", e);
    }
    if let Err(e) = state.watchlist.refresh().await {
        tracing::warn!("Initial watchlist refresh failed: {}", e);
    }

    let summary = state.summary();
    tracing::info!(
        "Portfolio: {} holdings, value {:.2}, P&L {:.2} ({:.2}%)",
        summary.holdings_count,
        summary.current_value,
        summary.total_pnl,
        summary.total_pnl_percentage
    );

    let settings = state.scheduler.get_settings();
    tracing::info!(
        "Auto-refresh {} every {}s",
        if settings.enabled { "on" } else { "off" },
        settings.interval_seconds
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    state.holdings.unmount();
    state.watchlist.unmount();
    Ok(())
}
