//! Liveness watchdog
//!
//! Periodically fails submissions stuck in Running past the submission
//! timeout plus a grace period, and requeues Queued submissions that fell
//! out of the in-memory queue (for example across a restart).

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{error::AppResult, models::FailureReason};

use super::{pipeline::Pipeline, queue::QueuedJob};

/// What one sweep did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub failed: usize,
    pub requeued: usize,
}

/// Watchdog loop; returns once `shutdown` fires
pub async fn run(pipeline: Pipeline, shutdown: CancellationToken) {
    let period = Duration::from_secs(pipeline.config().watchdog_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => break,
        }

        match sweep(&pipeline).await {
            Ok(report) if report != SweepReport::default() => {
                info!(failed = report.failed, requeued = report.requeued, "Watchdog sweep");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Watchdog sweep failed"),
        }
    }
}

/// Run a single sweep
pub async fn sweep(pipeline: &Pipeline) -> AppResult<SweepReport> {
    let now = Utc::now();
    let config = pipeline.config();
    let mut report = SweepReport::default();

    let stuck_cutoff = now - chrono::Duration::from_std(config.stuck_after()).unwrap_or_default();
    for submission in pipeline.store().list_running_before(stuck_cutoff).await? {
        warn!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            "Failing stuck submission"
        );
        if pipeline.aggregator().fail(&submission, FailureReason::Stuck).await? {
            report.failed += 1;
        }
        pipeline.cancel(submission.id);
    }

    let grace = chrono::Duration::seconds(config.watchdog_grace_secs as i64);
    for submission in pipeline.store().list_queued_before(now - grace).await? {
        let job = QueuedJob {
            submission_id: submission.id,
            user_id: submission.user_id,
        };
        if !pipeline.queue().contains(&job) && !pipeline.is_in_flight(submission.id) {
            pipeline.queue().push(job);
            report.requeued += 1;
        }
    }

    Ok(report)
}
