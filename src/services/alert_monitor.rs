use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use super::evaluator::{CycleReport, Evaluator};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// Drives one evaluation cycle per tick. Cycles never overlap.
pub struct AlertMonitor {
    evaluator: Evaluator,
    interval: Duration,
    store_timeout: Duration,
    phase: Phase,
    cycles: u64,
}

impl AlertMonitor {
    pub fn new(evaluator: Evaluator, interval: Duration, store_timeout: Duration) -> Self {
        Self {
            evaluator,
            interval,
            store_timeout,
            phase: Phase::Idle,
            cycles: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// list pending -> evaluate. Only a failed listing is reported as an error;
    /// everything after that is absorbed by the evaluator.
    pub async fn run_tick(&self) -> Result<CycleReport, StoreError> {
        let limit = self.store_timeout;
        let alerts = match time::timeout(limit, self.evaluator.store().list_pending()).await {
            Ok(res) => res?,
            Err(_) => return Err(StoreError::Timeout(limit)),
        };

        if alerts.is_empty() {
            info!("no pending alerts");
            return Ok(CycleReport::default());
        }

        info!(pending = alerts.len(), "scanning alerts");
        Ok(self.evaluator.run_cycle(alerts, Utc::now()).await)
    }

    /// Runs one cycle and always comes back to `Idle`, whatever happened inside it.
    pub async fn step(&mut self) {
        self.phase = Phase::Running;
        self.cycles += 1;

        let outcome = AssertUnwindSafe(self.run_tick()).catch_unwind().await;

        match outcome {
            Ok(Ok(report)) => {
                if report.symbols > 0 {
                    info!(
                        symbols = report.symbols,
                        unavailable = report.unavailable,
                        triggered = report.triggered,
                        notified = report.notified,
                        notify_failed = report.notify_failed,
                        marked = report.marked,
                        mark_failed = report.mark_failed,
                        expired = report.expired,
                        "cycle complete"
                    );
                }
            }
            Ok(Err(e)) => error!("[alert-monitor] tick error: {}", e),
            Err(_) => error!("[alert-monitor] tick panicked, continuing with next cycle"),
        }

        self.phase = Phase::Idle;
    }

    /// Loops until `shutdown` resolves. Shutdown is only observed between cycles.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(every = ?self.interval, "alert monitor started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            self.step().await;
        }

        info!(cycles = self.cycles, "alert monitor stopped");
    }
}

pub fn spawn_price_alert_monitor<F>(monitor: AlertMonitor, shutdown: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(monitor.run(shutdown))
}
