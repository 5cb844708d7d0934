use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tracker::InactivityTracker;
use super::window::{WindowMode, resolve_active_network};
use crate::chain::{ChainError, ChainReader, JobAddress, NetworkId, network_label};

/// Whether a stale job must also report `workable == true` before alerting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkablePolicy {
    /// Alert on staleness inside an active window alone.
    #[default]
    Ignore,
    /// Additionally call `workable(network)` and alert only when it is true.
    Require,
}

/// Why a job did not raise an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuietReason {
    /// No work observed since the job was first seen.
    NeverWorked,
    /// Worked recently enough.
    WithinThreshold { idle_blocks: u64 },
    /// Stale, but no network window is open right now.
    NoActiveNetwork,
    /// Stale inside a window, but the job reports nothing to do.
    NotWorkable,
}

impl fmt::Display for QuietReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuietReason::NeverWorked => write!(f, "never worked"),
            QuietReason::WithinThreshold { idle_blocks } => {
                write!(f, "worked {idle_blocks} blocks ago")
            }
            QuietReason::NoActiveNetwork => write!(f, "no active network"),
            QuietReason::NotWorkable => write!(f, "not workable"),
        }
    }
}

/// A job that has sat idle past the threshold while a network was on duty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactivityAlert {
    pub job: JobAddress,
    pub network: NetworkId,
    pub threshold: u64,
    pub last_worked_block: u64,
    pub current_block: u64,
    /// `true` when `workable` was queried and returned true.
    pub workable_confirmed: bool,
    pub detected_at: DateTime<Utc>,
}

impl InactivityAlert {
    pub fn idle_blocks(&self) -> u64 {
        self.current_block.saturating_sub(self.last_worked_block)
    }

    /// Text handed to the alert sink.
    pub fn message(&self) -> String {
        let workable = if self.workable_confirmed {
            "is workable but "
        } else {
            ""
        };
        format!(
            "Job {} {workable}hasn't been worked on for the past {} blocks on network {} \
             (last worked at block {}, current block {}).",
            self.job,
            self.threshold,
            network_label(&self.network),
            self.last_worked_block,
            self.current_block,
        )
    }
}

/// Outcome of evaluating one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDecision {
    Quiet(QuietReason),
    Alert(InactivityAlert),
}

impl AlertDecision {
    pub fn is_alert(&self) -> bool {
        matches!(self, AlertDecision::Alert(_))
    }
}

/// Decides whether a tracked job is idle past the threshold.
///
/// Performs chain reads only; delivering the alert is up to the caller.
pub struct LivenessEvaluator<'a, R> {
    reader: &'a R,
    window_mode: WindowMode,
    workable_policy: WorkablePolicy,
}

impl<'a, R: ChainReader> LivenessEvaluator<'a, R> {
    pub fn new(reader: &'a R, window_mode: WindowMode, workable_policy: WorkablePolicy) -> Self {
        Self {
            reader,
            window_mode,
            workable_policy,
        }
    }

    pub async fn check_inactivity(
        &self,
        tracker: &InactivityTracker,
        job: JobAddress,
        current_block: u64,
        threshold: u64,
    ) -> Result<AlertDecision, ChainError> {
        let last_worked_block = tracker.last_worked_block(&job);
        if last_worked_block == 0 {
            return Ok(AlertDecision::Quiet(QuietReason::NeverWorked));
        }

        let idle_blocks = current_block.saturating_sub(last_worked_block);
        if idle_blocks < threshold {
            return Ok(AlertDecision::Quiet(QuietReason::WithinThreshold { idle_blocks }));
        }

        let networks = self.reader.list_networks_with_windows().await?;
        let Some(network) = resolve_active_network(current_block, &networks, self.window_mode)
        else {
            return Ok(AlertDecision::Quiet(QuietReason::NoActiveNetwork));
        };

        let workable_confirmed = match self.workable_policy {
            WorkablePolicy::Ignore => false,
            WorkablePolicy::Require => {
                if !self.reader.is_workable(job, network).await? {
                    return Ok(AlertDecision::Quiet(QuietReason::NotWorkable));
                }
                true
            }
        };

        Ok(AlertDecision::Alert(InactivityAlert {
            job,
            network,
            threshold,
            last_worked_block,
            current_block,
            workable_confirmed,
            detected_at: Utc::now(),
        }))
    }
}
