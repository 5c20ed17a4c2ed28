//! Persistence backend
//!
//! Holdings and watchlists are stored by a remote REST backend when one is
//! configured, with the local SQLite database as fallback and mirror.

use crate::brokers::types::{Holding, WatchlistItem};
use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Storage for holdings and watchlist items
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn load_holdings(&self) -> Result<Vec<Holding>>;

    async fn save_holdings(&self, holdings: &[Holding]) -> Result<()>;

    async fn load_watchlist(&self) -> Result<Vec<WatchlistItem>>;

    async fn save_watchlist(&self, items: &[WatchlistItem]) -> Result<()>;
}

/// REST backend: `GET`/`PUT` on `{base}/holdings` and `{base}/watchlist`
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, resource: &str) -> Result<T> {
        let response = self.client.get(self.url(resource)).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Backend(format!(
                "GET /{} returned {}",
                resource,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn put_json<T: serde::Serialize + ?Sized>(&self, resource: &str, body: &T) -> Result<()> {
        let response = self.client.put(self.url(resource)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Backend(format!(
                "PUT /{} returned {}",
                resource,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceBackend for HttpBackend {
    async fn load_holdings(&self) -> Result<Vec<Holding>> {
        self.get_json("holdings").await
    }

    async fn save_holdings(&self, holdings: &[Holding]) -> Result<()> {
        self.put_json("holdings", holdings).await
    }

    async fn load_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        self.get_json("watchlist").await
    }

    async fn save_watchlist(&self, items: &[WatchlistItem]) -> Result<()> {
        self.put_json("watchlist", items).await
    }
}

/// Local SQLite backend
pub struct LocalBackend {
    db: Arc<SqliteDb>,
}

impl LocalBackend {
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersistenceBackend for LocalBackend {
    async fn load_holdings(&self) -> Result<Vec<Holding>> {
        self.db.load_holdings()
    }

    async fn save_holdings(&self, holdings: &[Holding]) -> Result<()> {
        self.db.save_holdings(holdings)
    }

    async fn load_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        self.db.load_watchlist()
    }

    async fn save_watchlist(&self, items: &[WatchlistItem]) -> Result<()> {
        self.db.save_watchlist(items)
    }
}

/// Remote-first backend that falls back to local storage on failure.
/// Writes always reach the local store so it can serve later fallbacks.
pub struct FallbackBackend {
    remote: Option<Box<dyn PersistenceBackend>>,
    local: LocalBackend,
}

impl FallbackBackend {
    pub fn new(remote: Option<Box<dyn PersistenceBackend>>, local: LocalBackend) -> Self {
        Self { remote, local }
    }

    pub fn local_only(local: LocalBackend) -> Self {
        Self::new(None, local)
    }
}

#[async_trait]
impl PersistenceBackend for FallbackBackend {
    async fn load_holdings(&self) -> Result<Vec<Holding>> {
        if let Some(remote) = &self.remote {
            match remote.load_holdings().await {
                Ok(holdings) => {
                    if let Err(e) = self.local.save_holdings(&holdings).await {
                        warn!("Failed to mirror holdings locally: {}", e);
                    }
                    return Ok(holdings);
                }
                Err(e) => warn!("Remote holdings unavailable, using local copy: {}", e),
            }
        }
        self.local.load_holdings().await
    }

    async fn save_holdings(&self, holdings: &[Holding]) -> Result<()> {
        self.local.save_holdings(holdings).await?;
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.save_holdings(holdings).await {
                warn!("Failed to save holdings remotely, kept local copy: {}", e);
            }
        }
        Ok(())
    }

    async fn load_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        if let Some(remote) = &self.remote {
            match remote.load_watchlist().await {
                Ok(items) => {
                    if let Err(e) = self.local.save_watchlist(&items).await {
                        warn!("Failed to mirror watchlist locally: {}", e);
                    }
                    return Ok(items);
                }
                Err(e) => warn!("Remote watchlist unavailable, using local copy: {}", e),
            }
        }
        self.local.load_watchlist().await
    }

    async fn save_watchlist(&self, items: &[WatchlistItem]) -> Result<()> {
        self.local.save_watchlist(items).await?;
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.save_watchlist(items).await {
                warn!("Failed to save watchlist remotely, kept local copy: {}", e);
            }
        }
        Ok(())
    }
}
