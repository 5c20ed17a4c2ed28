//! Scheduler module
//!
//! Handles periodic price refresh for the holdings and watchlist views.

mod auto_refresh;
pub mod settings;

pub use auto_refresh::{RefreshCallback, RefreshFuture, RefreshScheduler};
pub use settings::{RefreshSettings, RefreshSettingsUpdate, AVAILABLE_INTERVALS};
