//! Background status updater
//!
//! Once per tick the updater walks every stored order and asks each one that
//! is still `Ordered` to move to `InProgress`. The tracker's dwell gate
//! decides whether the move happens, so re-checking on every tick is safe.
//! `Delivered` is never set here; delivery is confirmed by callers.
//!
//! States:
//! - Waiting: sleeping until the next tick
//! - Scanning: applying eligible transitions across the store

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::store::PriorityStore;
use crate::types::{Order, OrderStatus};

/// Time between two scans
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("status updater task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of one scan over the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Orders looked at
    pub examined: usize,
    /// Orders moved to `InProgress`
    pub advanced: usize,
    /// Orders whose update panicked and was skipped
    pub failed: usize,
    /// Scan stopped early because shutdown was requested
    pub interrupted: bool,
}

/// Periodic scanner that advances `Ordered` orders to `InProgress`
#[derive(Debug, Clone)]
pub struct StatusUpdater {
    store: Arc<PriorityStore>,
}

impl StatusUpdater {
    pub fn new(store: Arc<PriorityStore>) -> Self {
        Self { store }
    }

    /// Run a single full scan
    pub fn scan_once(&self) -> ScanReport {
        self.scan(|| false)
    }

    fn scan(&self, should_stop: impl Fn() -> bool) -> ScanReport {
        self.scan_with(should_stop, |order| {
            order
                .tracker()
                .advance_from(OrderStatus::Ordered, OrderStatus::InProgress)
        })
    }

    fn scan_with<F>(&self, should_stop: impl Fn() -> bool, apply: F) -> ScanReport
    where
        F: Fn(&Order) -> bool,
    {
        let mut report = ScanReport::default();

        for order in self.store.snapshot() {
            if should_stop() {
                report.interrupted = true;
                break;
            }

            report.examined += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| apply(&order))) {
                Ok(true) => {
                    report.advanced += 1;
                    debug!(id = order.id, priority = order.priority, "Order moved to IN_PROGRESS");
                }
                Ok(false) => {}
                Err(_) => {
                    report.failed += 1;
                    error!(id = order.id, "Status update failed, skipping order");
                }
            }
        }

        report
    }

    /// Start the periodic loop on the current tokio runtime
    pub fn spawn(self) -> UpdaterHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(self.run(Arc::clone(&stop), shutdown_rx));
        info!(tick_ms = TICK_INTERVAL.as_millis() as u64, "Status updater started");

        UpdaterHandle {
            stop,
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(self, stop: Arc<AtomicBool>, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; start out waiting a full period.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }

                    let report = self.scan(|| stop.load(Ordering::SeqCst));
                    if report.advanced > 0 || report.failed > 0 {
                        info!(
                            examined = report.examined,
                            advanced = report.advanced,
                            failed = report.failed,
                            "Status scan complete"
                        );
                    }
                    if report.interrupted {
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!("Status updater stopped");
    }
}

/// Handle to a running [`StatusUpdater`]
///
/// Dropping the handle also signals the loop to stop, but only
/// [`UpdaterHandle::shutdown`] waits for it to finish.
#[derive(Debug)]
pub struct UpdaterHandle {
    stop: Arc<AtomicBool>,
    shutdown_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl UpdaterHandle {
    /// Signal the loop to stop and wait for it. An in-flight scan is cut
    /// short at the next order boundary.
    pub async fn shutdown(mut self) -> Result<(), UpdaterError> {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.try_send(());
    }
}

impl Drop for UpdaterHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
