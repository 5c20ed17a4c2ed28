//! SQLite database module

mod kv;
mod migrations;
mod portfolio;

use crate::brokers::types::{Holding, WatchlistItem};
use crate::db::KeyValueStore;
use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open (or create) the database file and apply migrations
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Holdings Methods ==========

    pub fn load_holdings(&self) -> Result<Vec<Holding>> {
        let conn = self.conn.lock();
        portfolio::load_holdings(&conn)
    }

    pub fn save_holdings(&self, holdings: &[Holding]) -> Result<()> {
        let mut conn = self.conn.lock();
        portfolio::save_holdings(&mut conn, holdings)
    }

    // ========== Watchlist Methods ==========

    pub fn load_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        let conn = self.conn.lock();
        portfolio::load_watchlist(&conn)
    }

    pub fn save_watchlist(&self, items: &[WatchlistItem]) -> Result<()> {
        let mut conn = self.conn.lock();
        portfolio::save_watchlist(&mut conn, items)
    }
}

impl KeyValueStore for SqliteDb {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        kv::get(&conn, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        kv::set(&conn, key, value)
    }
}
