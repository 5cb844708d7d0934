use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::alert::AlertSink;
use crate::chain::{ChainError, ChainEvent, ChainReader, JobAddress, network_label};
use crate::monitor::{
    AlertDecision, InactivityTracker, LivenessEvaluator, SubscriptionManager, WindowMode,
    WorkablePolicy,
};

/// Evaluation knobs shared by the daemon and the one-shot check.
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub threshold: u64,
    pub window_mode: WindowMode,
    pub workable_policy: WorkablePolicy,
}

/// Evaluation result for a single job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: JobAddress,
    pub last_worked_block: u64,
    /// Chain read failures are kept as text so one job cannot fail the cycle.
    pub outcome: Result<AlertDecision, String>,
}

/// Summary of one pass over the roster.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub current_block: u64,
    pub jobs: Vec<JobReport>,
    pub delivered: usize,
    pub delivery_failures: usize,
}

impl CheckReport {
    pub fn alerts(&self) -> usize {
        self.jobs
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(d) if d.is_alert()))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.jobs.iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Evaluate every tracked job at `current_block`.
pub async fn evaluate_jobs<R: ChainReader>(
    evaluator: &LivenessEvaluator<'_, R>,
    tracker: &InactivityTracker,
    current_block: u64,
    threshold: u64,
) -> Vec<JobReport> {
    let mut reports = Vec::with_capacity(tracker.len());
    for job in tracker.jobs() {
        let outcome = evaluator
            .check_inactivity(tracker, job, current_block, threshold)
            .await
            .map_err(|e| {
                warn!(%job, error = %e, "liveness check failed");
                e.to_string()
            });
        if let Ok(AlertDecision::Quiet(reason)) = &outcome {
            debug!(%job, %reason, "job quiet");
        }
        reports.push(JobReport {
            job,
            last_worked_block: tracker.last_worked_block(&job),
            outcome,
        });
    }
    reports
}

/// Build a tracker for the current roster, replaying Work logs of the last
/// `since` blocks when given so jobs start from their real last-worked block.
pub async fn seed_tracker<R: ChainReader>(
    reader: &R,
    since: Option<u64>,
    max_block_range: u64,
) -> Result<InactivityTracker, ChainError> {
    let head = reader.current_block_number().await?;
    let jobs = reader.list_jobs().await?;

    let mut tracker = InactivityTracker::new();
    for job in &jobs {
        tracker.on_job_added(*job);
    }

    if let Some(since) = since {
        let mut subscriptions = SubscriptionManager::new(max_block_range);
        subscriptions.attach(&jobs, head.saturating_sub(since).saturating_add(1));
        while !subscriptions.is_caught_up() {
            for event in subscriptions.poll_once(reader).await? {
                tracker.apply(event);
            }
        }
        debug!(head, since, "history replayed");
    }
    Ok(tracker)
}

/// Send every alert in `reports` to `sink`. Returns `(delivered, failed)`.
pub async fn deliver_alerts<S: AlertSink>(sink: &S, reports: &[JobReport]) -> (usize, usize) {
    let mut delivered = 0;
    let mut failed = 0;
    for report in reports {
        let Ok(AlertDecision::Alert(alert)) = &report.outcome else {
            continue;
        };
        warn!(
            job = %alert.job,
            network = %network_label(&alert.network),
            idle_blocks = alert.idle_blocks(),
            threshold = alert.threshold,
            detected_at = %alert.detected_at,
            "job inactive"
        );
        match sink.send_alert(&alert.message()).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(job = %alert.job, error = %e, "alert delivery failed");
                failed += 1;
            }
        }
    }
    (delivered, failed)
}

/// Owns the inactivity tracker and drives periodic checks.
///
/// The watcher is the only writer of the tracker: subscription events reach
/// it through a queue and are applied between checks.
pub struct Watcher<'a, R, S> {
    reader: &'a R,
    sink: &'a S,
    tracker: InactivityTracker,
    settings: WatchSettings,
}

impl<'a, R: ChainReader, S: AlertSink> Watcher<'a, R, S> {
    pub fn new(reader: &'a R, sink: &'a S, settings: WatchSettings) -> Self {
        Self {
            reader,
            sink,
            tracker: InactivityTracker::new(),
            settings,
        }
    }

    pub fn tracker(&self) -> &InactivityTracker {
        &self.tracker
    }

    /// Seed the roster from the sequencer and attach `subscriptions` at the
    /// next block. Does nothing if `subscriptions` is already attached.
    pub async fn attach_subscriptions(
        &mut self,
        subscriptions: &mut SubscriptionManager,
    ) -> Result<(), ChainError> {
        if subscriptions.is_attached() {
            return Ok(());
        }

        let head = self.reader.current_block_number().await?;
        let jobs = self.reader.list_jobs().await?;
        for job in &jobs {
            self.tracker.on_job_added(*job);
        }
        subscriptions.attach(&jobs, head.saturating_add(1));

        info!(head, jobs = jobs.len(), "roster loaded");
        Ok(())
    }

    pub fn apply(&mut self, event: ChainEvent) {
        if self.tracker.apply(event) {
            debug!(job = %event.job(), ?event, "registry updated");
        }
    }

    /// Evaluate every tracked job and deliver alerts.
    ///
    /// Returns `None` when the head could not be read; the cycle is skipped.
    pub async fn run_periodic_check(&mut self, threshold: u64) -> Option<CheckReport> {
        let current_block = match self.reader.current_block_number().await {
            Ok(block) => block,
            Err(e) => {
                warn!(error = %e, "skipping check, head unavailable");
                return None;
            }
        };

        if self.tracker.is_empty() {
            debug!(current_block, "no jobs registered");
        }

        let evaluator = LivenessEvaluator::new(
            self.reader,
            self.settings.window_mode,
            self.settings.workable_policy,
        );
        let jobs = evaluate_jobs(&evaluator, &self.tracker, current_block, threshold).await;
        let (delivered, delivery_failures) = deliver_alerts(self.sink, &jobs).await;

        let report = CheckReport {
            current_block,
            jobs,
            delivered,
            delivery_failures,
        };
        info!(
            current_block,
            jobs = report.jobs.len(),
            alerts = report.alerts(),
            errors = report.errors(),
            "check complete"
        );
        Some(report)
    }

    /// Apply queued events and run a check every `check_interval` until the
    /// queue closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ChainEvent>, check_interval: Duration) {
        let mut ticker = interval(check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let threshold = self.settings.threshold;
                    self.run_periodic_check(threshold).await;
                }
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        info!("event queue closed, stopping watcher");
                        return;
                    }
                },
            }
        }
    }
}
