//! Judge workers
//!
//! Each worker takes the next job from the fair queue, claims it, runs it
//! through the executor and hands the outcome to the aggregator. A worker
//! judges one submission at a time.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::AppResult,
    models::FailureReason,
};

use super::{executor::ExecutionError, pipeline::Pipeline, queue::QueuedJob};

/// Worker loop; returns once `shutdown` fires
pub async fn run(pipeline: Pipeline, worker: usize, shutdown: CancellationToken) {
    info!(worker, "Judge worker started");

    while let Some(job) = pipeline.queue().next(&shutdown).await {
        if let Err(e) = judge(&pipeline, job, worker, &shutdown).await {
            error!(
                worker,
                submission_id = %job.submission_id,
                error = %e,
                "Failed to judge submission"
            );
        }
    }

    info!(worker, "Judge worker stopped");
}

async fn judge(
    pipeline: &Pipeline,
    job: QueuedJob,
    worker: usize,
    shutdown: &CancellationToken,
) -> AppResult<()> {
    // Registered before the claim so a supersede racing the claim still reaches us
    let cancel = pipeline.register(job.submission_id, shutdown);
    let result = judge_claimed(pipeline, job, worker, shutdown, &cancel).await;
    pipeline.unregister(job.submission_id);
    result
}

async fn judge_claimed(
    pipeline: &Pipeline,
    job: QueuedJob,
    worker: usize,
    shutdown: &CancellationToken,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let Some(submission) = pipeline.store().claim_submission(job.submission_id).await? else {
        debug!(worker, submission_id = %job.submission_id, "Submission no longer queued, skipping");
        return Ok(());
    };

    info!(
        worker,
        submission_id = %submission.id,
        user_id = %submission.user_id,
        language = %submission.language,
        "Judging submission"
    );

    let Some(challenge) = pipeline.store().find_challenge(submission.challenge_id).await? else {
        pipeline
            .aggregator()
            .fail(&submission, FailureReason::Internal("challenge no longer exists".to_string()))
            .await?;
        return Ok(());
    };

    let executed = pipeline
        .executor()
        .execute(&submission, &challenge.test_cases, pipeline.limits(), cancel)
        .await;

    match executed {
        Ok(outcome) => {
            pipeline.aggregator().finalize(&submission, &outcome).await?;
        }
        Err(ExecutionError::Cancelled) if shutdown.is_cancelled() => {
            // Left Running; the watchdog settles it after restart
            warn!(worker, submission_id = %submission.id, "Judging interrupted by shutdown");
        }
        Err(ExecutionError::Cancelled) => {
            info!(worker, submission_id = %submission.id, "Judging aborted");
        }
        Err(ExecutionError::Provision(message)) => {
            warn!(worker, submission_id = %submission.id, error = %message, "Sandbox provisioning failed");
            pipeline
                .aggregator()
                .fail(&submission, FailureReason::SandboxProvision(message))
                .await?;
        }
        Err(ExecutionError::Sandbox(message)) => {
            error!(worker, submission_id = %submission.id, error = %message, "Sandbox failed while judging");
            pipeline
                .aggregator()
                .fail(&submission, FailureReason::Internal(message))
                .await?;
        }
    }

    Ok(())
}
