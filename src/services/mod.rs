//! Services Layer
//!
//! Business logic used by the views and the application entry point.
//!
//! # Services
//!
//! - `QuotesService` - Batch quotes with a last-quote cache
//! - `PortfolioService` - P&L, aggregate metrics, quote merging
//! - `ImportService` - Holdings CSV import
//! - `backend` - Remote persistence with local fallback

pub mod backend;
pub mod import_service;
pub mod portfolio_service;
pub mod quotes_service;

pub use backend::{FallbackBackend, HttpBackend, LocalBackend, PersistenceBackend};
pub use import_service::{ImportResult, ImportService};
pub use portfolio_service::{HoldingMetrics, PortfolioService, PortfolioSummary};
pub use quotes_service::QuotesService;
