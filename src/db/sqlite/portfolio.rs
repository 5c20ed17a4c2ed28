//! Local copies of holdings and watchlist items
//!
//! Each save replaces the whole list inside one transaction, keeping the
//! caller's ordering in the `position` column.

use crate::brokers::types::{Holding, WatchlistItem};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

fn to_text(ts: &Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

fn from_text(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Load all holdings in saved order
pub fn load_holdings(conn: &Connection) -> Result<Vec<Holding>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, exchange, quantity, average_price, ltp, prev_close, last_updated
         FROM holdings ORDER BY position, symbol",
    )?;

    let holdings = stmt
        .query_map([], |row| {
            Ok(Holding {
                id: row.get(0)?,
                symbol: row.get(1)?,
                exchange: row.get(2)?,
                quantity: row.get(3)?,
                average_price: row.get(4)?,
                ltp: row.get(5)?,
                prev_close: row.get(6)?,
                last_updated: from_text(row.get(7)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(holdings)
}

/// Replace all holdings
pub fn save_holdings(conn: &mut Connection, holdings: &[Holding]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM holdings", [])?;

    let mut stmt = tx.prepare(
        "INSERT INTO holdings (id, symbol, exchange, quantity, average_price, ltp, prev_close, last_updated, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    for (position, h) in holdings.iter().enumerate() {
        stmt.execute(params![
            h.id,
            h.symbol,
            h.exchange,
            h.quantity,
            h.average_price,
            h.ltp,
            h.prev_close,
            to_text(&h.last_updated),
            position as i64,
        ])?;
    }

    drop(stmt);
    tx.commit()?;

    tracing::debug!("Stored {} holdings locally", holdings.len());
    Ok(())
}

/// Load all watchlist items in saved order
pub fn load_watchlist(conn: &Connection) -> Result<Vec<WatchlistItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, exchange, ltp, change, change_percent, last_updated
         FROM watchlist ORDER BY position, symbol",
    )?;

    let items = stmt
        .query_map([], |row| {
            Ok(WatchlistItem {
                id: row.get(0)?,
                symbol: row.get(1)?,
                exchange: row.get(2)?,
                ltp: row.get(3)?,
                change: row.get(4)?,
                change_percent: row.get(5)?,
                last_updated: from_text(row.get(6)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Replace all watchlist items
pub fn save_watchlist(conn: &mut Connection, items: &[WatchlistItem]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM watchlist", [])?;

    let mut stmt = tx.prepare(
        "INSERT INTO watchlist (id, symbol, exchange, ltp, change, change_percent, last_updated, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    for (position, item) in items.iter().enumerate() {
        stmt.execute(params![
            item.id,
            item.symbol,
            item.exchange,
            item.ltp,
            item.change,
            item.change_percent,
            to_text(&item.last_updated),
            position as i64,
        ])?;
    }

    drop(stmt);
    tx.commit()?;

    tracing::debug!("Stored {} watchlist items locally", items.len());
    Ok(())
}
