//! Auto-refresh scheduler
//!
//! Runs named refresh callbacks (one per view, e.g. "holdings" and
//! "watchlist") on a repeating timer while auto-refresh is enabled.
//!
//! - One timer per registered id; re-registering replaces both the
//!   callback and its timer.
//! - Ticks are wall-clock periodic. A tick that finds the previous run of
//!   the same id still in flight is skipped.
//! - Callback errors and panics are logged with the task id and never stop
//!   the timer or affect other tasks.
//! - Stopping a timer prevents further ticks but lets an in-flight run
//!   finish.

use crate::db::KeyValueStore;
use crate::error::{AppError, Result};
use crate::scheduler::settings::{
    self, RefreshSettings, RefreshSettingsUpdate, AVAILABLE_INTERVALS, DEFAULT_INTERVAL_SECS,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub type RefreshFuture = BoxFuture<'static, Result<()>>;

/// Refresh unit of work registered by a view
pub type RefreshCallback = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

struct RegisteredTask {
    callback: RefreshCallback,
    running: Arc<AtomicBool>,
}

/// Timer task handle; dropping it stops the timer
struct TimerHandle(JoinHandle<()>);

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Marks a task id as in flight until dropped
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(RunGuard(flag.clone()))
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct SchedulerState {
    settings: RefreshSettings,
    tasks: HashMap<String, RegisteredTask>,
    timers: HashMap<String, TimerHandle>,
}

/// Auto-refresh scheduler, built once at startup and shared by reference
pub struct RefreshScheduler {
    store: Arc<dyn KeyValueStore>,
    runtime: Handle,
    state: Mutex<SchedulerState>,
}

impl RefreshScheduler {
    /// Create a scheduler bound to the current Tokio runtime, initialized
    /// from the settings persisted in `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            AppError::Internal(format!("Refresh scheduler needs a Tokio runtime: {}", e))
        })?;

        let settings = settings::load_settings(store.as_ref());
        info!(
            "Auto-refresh {} (interval {}s)",
            if settings.enabled { "enabled" } else { "disabled" },
            settings.interval_seconds
        );

        Ok(Self {
            store,
            runtime,
            state: Mutex::new(SchedulerState {
                settings,
                tasks: HashMap::new(),
                timers: HashMap::new(),
            }),
        })
    }

    /// Read persisted settings, defaults when missing or corrupt
    pub fn load_settings(&self) -> RefreshSettings {
        settings::load_settings(self.store.as_ref())
    }

    /// Persist `settings`. Failures are logged, not returned.
    pub fn save_settings(&self, settings: &RefreshSettings) {
        settings::save_settings(self.store.as_ref(), settings);
    }

    /// Merge `update` into the current settings and persist them.
    ///
    /// Running timers are rebuilt so a new interval applies immediately.
    /// Intervals outside [`AVAILABLE_INTERVALS`] are rejected and leave the
    /// settings untouched.
    pub fn update_settings(&self, update: RefreshSettingsUpdate) -> Result<RefreshSettings> {
        if let Some(secs) = update.interval_seconds {
            if !settings::is_available_interval(secs) {
                return Err(AppError::InvalidInterval(secs));
            }
        }

        let mut state = self.state.lock();
        state.settings.merge(&update);
        let current = state.settings;
        self.save_settings(&current);

        self.stop_all(&mut state);
        if current.enabled {
            self.start_all(&mut state);
        }

        info!(
            "Auto-refresh settings updated: enabled={}, interval={}s",
            current.enabled, current.interval_seconds
        );
        Ok(current)
    }

    /// Flip auto-refresh on or off and return the new state
    pub fn toggle(&self) -> bool {
        let mut state = self.state.lock();
        state.settings.enabled = !state.settings.enabled;
        let current = state.settings;
        self.save_settings(&current);

        if current.enabled {
            self.start_all(&mut state);
            info!("Auto-refresh enabled for {} task(s)", state.tasks.len());
        } else {
            self.stop_all(&mut state);
            info!("Auto-refresh disabled");
        }

        current.enabled
    }

    /// Register (or replace) the refresh callback for `id`
    pub fn register<F, Fut>(&self, id: &str, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback: RefreshCallback = Arc::new(move || callback().boxed());

        let mut state = self.state.lock();
        let running = state
            .tasks
            .get(id)
            .map(|task| task.running.clone())
            .unwrap_or_default();
        let replaced = state
            .tasks
            .insert(id.to_string(), RegisteredTask { callback, running })
            .is_some();

        debug!(task = %id, replaced, "Registered refresh task");

        if state.settings.enabled {
            self.start_timer(&mut state, id);
        }
    }

    /// Remove the task for `id` and stop its timer. Unknown ids are ignored.
    pub fn unregister(&self, id: &str) {
        let mut state = self.state.lock();
        state.timers.remove(id);
        if state.tasks.remove(id).is_some() {
            debug!(task = %id, "Unregistered refresh task");
        }
    }

    pub fn get_settings(&self) -> RefreshSettings {
        self.state.lock().settings
    }

    pub fn get_available_intervals(&self) -> Vec<u64> {
        AVAILABLE_INTERVALS.to_vec()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().settings.enabled
    }

    pub fn get_interval(&self) -> u64 {
        self.state.lock().settings.interval_seconds
    }

    /// Registered task ids, sorted
    pub fn registered_tasks(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().tasks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of live timers
    pub fn active_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    fn start_all(&self, state: &mut SchedulerState) {
        let ids: Vec<String> = state.tasks.keys().cloned().collect();
        for id in ids {
            self.start_timer(state, &id);
        }
    }

    fn stop_all(&self, state: &mut SchedulerState) {
        let stopped = state.timers.len();
        state.timers.clear();
        if stopped > 0 {
            debug!("Stopped {} refresh timer(s)", stopped);
        }
    }

    fn start_timer(&self, state: &mut SchedulerState, id: &str) {
        let Some(task) = state.tasks.get(id) else {
            return;
        };

        let mut period = state.settings.interval();
        let first_tick = match Instant::now().checked_add(period) {
            Some(at) => at,
            None => {
                warn!(
                    task = %id,
                    "Refresh interval {}s is too large, using {}s",
                    period.as_secs(),
                    DEFAULT_INTERVAL_SECS
                );
                period = Duration::from_secs(DEFAULT_INTERVAL_SECS);
                Instant::now() + period
            }
        };
        let handle = self.runtime.spawn(run_timer(
            id.to_string(),
            first_tick,
            period,
            task.callback.clone(),
            task.running.clone(),
        ));

        // Inserting drops (and aborts) any previous timer for the id
        state.timers.insert(id.to_string(), TimerHandle(handle));
        debug!(task = %id, "Refresh timer started ({}s)", period.as_secs());
    }
}

async fn run_timer(
    id: String,
    first_tick: Instant,
    period: Duration,
    callback: RefreshCallback,
    running: Arc<AtomicBool>,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(guard) = RunGuard::try_acquire(&running) else {
            debug!(task = %id, "Skipping refresh tick, previous run still in flight");
            continue;
        };

        let id = id.clone();
        let callback = callback.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = AssertUnwindSafe(async move { callback().await })
                .catch_unwind()
                .await;

            let message = match outcome {
                Ok(Ok(())) => {
                    debug!(task = %id, "Refresh completed");
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => "callback panicked".to_string(),
            };
            warn!(task = %id, "{}", AppError::Task { id: id.clone(), message });
        });
    }
}
