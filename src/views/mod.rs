//! Views
//!
//! View-side state for holdings and the watchlist. A view keeps a refresh
//! task registered with the scheduler while it is mounted and has at least
//! one item.

mod holdings;
mod watchlist;

pub use holdings::{HoldingsView, HOLDINGS_TASK_ID};
pub use watchlist::{WatchlistView, WATCHLIST_TASK_ID};

use crate::error::Result;
use crate::scheduler::RefreshScheduler;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct BindingState {
    mounted: bool,
    registered: bool,
}

/// Ties one view to its scheduler registration
pub struct RefreshBinding {
    id: &'static str,
    scheduler: Arc<RefreshScheduler>,
    state: Mutex<BindingState>,
}

impl RefreshBinding {
    pub fn new(id: &'static str, scheduler: Arc<RefreshScheduler>) -> Self {
        Self {
            id,
            scheduler,
            state: Mutex::new(BindingState::default()),
        }
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.state.lock().mounted = mounted;
    }

    pub fn is_mounted(&self) -> bool {
        self.state.lock().mounted
    }

    pub fn is_registered(&self) -> bool {
        self.state.lock().registered
    }

    /// Register or unregister so the task exists exactly while the view is
    /// mounted with items
    pub fn sync<F, Fut>(&self, has_items: bool, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let mut state = self.state.lock();
        let wanted = state.mounted && has_items;

        if wanted && !state.registered {
            self.scheduler.register(self.id, callback);
            state.registered = true;
            debug!(task = %self.id, "View registered for auto-refresh");
        } else if !wanted && state.registered {
            self.scheduler.unregister(self.id);
            state.registered = false;
            debug!(task = %self.id, "View unregistered from auto-refresh");
        }
    }
}

impl Drop for RefreshBinding {
    fn drop(&mut self) {
        if self.state.get_mut().registered {
            self.scheduler.unregister(self.id);
        }
    }
}
