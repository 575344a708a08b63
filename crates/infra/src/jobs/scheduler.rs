use std::time::Duration;

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::overdue_sweep::{OverdueSweep, SweepReport};

/// Longest single sleep; the wall clock is re-read after each one.
const MAX_IDLE: Duration = Duration::from_secs(60);

/// Config for the daily sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepScheduler {
    /// Local wall-clock time of the daily run.
    pub run_at: NaiveTime,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self {
            run_at: NaiveTime::MIN,
            max_retries: 3,
            base_backoff: Duration::from_secs(30),
        }
    }
}

/// Handle for the running scheduler (trigger, reports, shutdown).
#[derive(Debug)]
pub struct SweepSchedulerHandle {
    trigger: mpsc::Sender<()>,
    shutdown: oneshot::Sender<()>,
    reports: watch::Receiver<Option<SweepReport>>,
    join: JoinHandle<()>,
}

impl SweepSchedulerHandle {
    /// Ask for a run now. Triggers are coalesced: if one is already
    /// pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Latest report; updated after every successful run.
    pub fn reports(&self) -> watch::Receiver<Option<SweepReport>> {
        self.reports.clone()
    }

    /// Stop the scheduler and wait for an in-flight run to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.join.await {
            warn!(error = %e, "overdue sweep scheduler task ended abnormally");
        }
    }
}

impl SweepScheduler {
    pub fn at(run_at: NaiveTime) -> Self {
        Self {
            run_at,
            ..Self::default()
        }
    }

    /// Spawn the scheduler onto the current tokio runtime.
    ///
    /// - Schedule: once a day at `run_at`, local time
    /// - Manual: `handle.trigger()`
    /// - Failures: logged and retried with bounded exponential backoff; never propagate
    pub fn spawn(&self, sweep: OverdueSweep) -> SweepSchedulerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (report_tx, report_rx) = watch::channel(None);

        let cfg = self.clone();
        let join = tokio::spawn(scheduler_loop(cfg, sweep, shutdown_rx, trigger_rx, report_tx));

        SweepSchedulerHandle {
            trigger: trigger_tx,
            shutdown: shutdown_tx,
            reports: report_rx,
            join,
        }
    }
}

async fn scheduler_loop(
    cfg: SweepScheduler,
    sweep: OverdueSweep,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut trigger_rx: mpsc::Receiver<()>,
    reports: watch::Sender<Option<SweepReport>>,
) {
    let mut next_run = next_run_after(Local::now().naive_local(), cfg.run_at);
    info!(run_at = %cfg.run_at, next_run = %next_run, grace_days = sweep.grace_days(), "overdue sweep scheduler started");

    let mut pending = false;
    let mut failures: u32 = 0;
    let mut retry_at: Option<Instant> = None;

    loop {
        let now = Local::now().naive_local();
        if now >= next_run {
            pending = true;
            next_run = next_run_after(now, cfg.run_at);
        }

        if let Some(at) = retry_at {
            if Instant::now() >= at {
                retry_at = None;
                pending = true;
            }
        }

        if pending {
            pending = false;
            match sweep.run().await {
                Ok(report) => {
                    failures = 0;
                    retry_at = None;
                    reports.send_replace(Some(report));
                }
                Err(e) => {
                    failures += 1;
                    if failures <= cfg.max_retries {
                        let delay = backoff(cfg.base_backoff, failures);
                        warn!(error = %e, attempt = failures, retry_in_ms = delay.as_millis() as u64, "overdue sweep failed");
                        retry_at = Some(Instant::now() + delay);
                    } else {
                        error!(error = %e, "overdue sweep failed; giving up until next run");
                        failures = 0;
                        retry_at = None;
                    }
                }
            }
            continue;
        }

        let mut wait = until(now, next_run).min(MAX_IDLE);
        if let Some(at) = retry_at {
            wait = wait.min(at.saturating_duration_since(Instant::now()));
        }

        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            t = trigger_rx.recv() => match t {
                Some(()) => pending = true,
                None => break,
            },
            _ = tokio::time::sleep(wait) => {}
        }
    }

    info!("overdue sweep scheduler stopped");
}

/// First occurrence of `at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today_at = now.date().and_time(at);
    if today_at > now {
        return today_at;
    }
    today_at
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDateTime::MAX)
}

fn until(now: NaiveDateTime, then: NaiveDateTime) -> Duration {
    (then - now).to_std().unwrap_or(Duration::ZERO)
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // base * 2^(attempt-1), capped at one hour.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    base.saturating_mul(pow).min(Duration::from_secs(3600))
}
