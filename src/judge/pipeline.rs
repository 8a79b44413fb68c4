//! Judging pipeline handle
//!
//! Ties the queue, the in-flight registry, the executor and the aggregator
//! together. Cloning is cheap; every worker, the watchdog and the HTTP layer
//! share one pipeline.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    config::JudgeConfig,
    db::JudgeStore,
    error::AppResult,
    models::{FailureReason, NewSubmission, Submission},
};

use super::{
    aggregator::Aggregator,
    executor::{ExecutionLimits, Executor},
    notifier::Notifier,
    queue::{FairQueue, QueuedJob},
    sandbox::Sandbox,
    watchdog, worker,
};

/// Result of accepting a submission
#[derive(Debug, Clone)]
pub struct Enqueued {
    pub submission: Submission,
    /// The in-flight submission this one replaced
    pub superseded: Option<Uuid>,
}

/// Shared judging pipeline
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    store: Arc<dyn JudgeStore>,
    queue: FairQueue,
    in_flight: Mutex<HashMap<Uuid, CancellationToken>>,
    /// Serialises supersede-then-insert so two submits cannot both win
    enqueue_lock: tokio::sync::Mutex<()>,
    executor: Executor,
    aggregator: Aggregator,
    notifier: Notifier,
    config: JudgeConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn JudgeStore>,
        sandbox: Arc<dyn Sandbox>,
        notifier: Notifier,
        config: JudgeConfig,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                aggregator: Aggregator::new(store.clone(), notifier.clone()),
                executor: Executor::new(sandbox),
                store,
                queue: FairQueue::new(),
                in_flight: Mutex::new(HashMap::new()),
                enqueue_lock: tokio::sync::Mutex::new(()),
                notifier,
                config,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn JudgeStore> {
        &self.inner.store
    }

    pub fn queue(&self) -> &FairQueue {
        &self.inner.queue
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.inner.config
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    pub(crate) fn aggregator(&self) -> &Aggregator {
        &self.inner.aggregator
    }

    pub(crate) fn limits(&self) -> ExecutionLimits {
        ExecutionLimits::from(&self.inner.config)
    }

    /// Persist a Queued submission and schedule it
    ///
    /// An in-flight submission for the same user and challenge is failed as
    /// superseded first: pulled from the queue if still waiting, or its
    /// worker is told to abort.
    pub async fn enqueue(&self, new: NewSubmission) -> AppResult<Enqueued> {
        let _guard = self.inner.enqueue_lock.lock().await;

        let superseded = match self
            .inner
            .store
            .find_in_flight(new.user_id, new.challenge_id)
            .await?
        {
            Some(previous) => {
                self.supersede(&previous).await?;
                Some(previous.id)
            }
            None => None,
        };

        let submission = match self.inner.store.create_submission(new).await {
            Ok(submission) => submission,
            Err(e) => {
                // The superseded submission is already Failed and cannot come back
                if let Some(previous) = superseded {
                    error!(
                        superseded = %previous,
                        error = %e,
                        "Submission insert failed after superseding the previous one"
                    );
                }
                return Err(e);
            }
        };
        self.inner.queue.push(QueuedJob {
            submission_id: submission.id,
            user_id: submission.user_id,
        });

        info!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            challenge_id = %submission.challenge_id,
            queued = self.inner.queue.len(),
            "Submission queued"
        );

        Ok(Enqueued {
            submission,
            superseded,
        })
    }

    async fn supersede(&self, previous: &Submission) -> AppResult<()> {
        self.inner.queue.remove(&QueuedJob {
            submission_id: previous.id,
            user_id: previous.user_id,
        });
        self.inner
            .aggregator
            .fail(previous, FailureReason::Superseded)
            .await?;
        self.cancel(previous.id);
        Ok(())
    }

    /// Delete a challenge, failing its in-flight submissions first
    ///
    /// Holds the enqueue lock so no submission for the challenge can slip in
    /// between the sweep and the delete. Returns `false` if it did not exist.
    pub async fn delete_challenge(&self, challenge_id: Uuid) -> AppResult<bool> {
        let _guard = self.inner.enqueue_lock.lock().await;

        let in_flight = self
            .inner
            .store
            .list_in_flight_for_challenge(challenge_id)
            .await?;
        for submission in &in_flight {
            self.inner.queue.remove(&QueuedJob {
                submission_id: submission.id,
                user_id: submission.user_id,
            });
            self.inner
                .aggregator
                .fail(
                    submission,
                    FailureReason::Internal("challenge was deleted".to_string()),
                )
                .await?;
            self.cancel(submission.id);
        }

        if !in_flight.is_empty() {
            info!(
                challenge_id = %challenge_id,
                count = in_flight.len(),
                "Aborted submissions of deleted challenge"
            );
        }

        self.inner.store.delete_challenge(challenge_id).await
    }

    /// Push every persisted Queued submission back into the queue
    pub async fn recover(&self) -> AppResult<usize> {
        let queued = self.inner.store.list_queued().await?;
        for submission in &queued {
            self.inner.queue.push(QueuedJob {
                submission_id: submission.id,
                user_id: submission.user_id,
            });
        }

        if !queued.is_empty() {
            info!(count = queued.len(), "Recovered queued submissions");
        }
        Ok(queued.len())
    }

    /// Start the worker pool
    pub fn spawn_workers(&self, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
        (0..self.inner.config.worker_count)
            .map(|id| tokio::spawn(worker::run(self.clone(), id, shutdown.clone())))
            .collect()
    }

    /// Start the liveness watchdog
    pub fn spawn_watchdog(&self, shutdown: &CancellationToken) -> JoinHandle<()> {
        tokio::spawn(watchdog::run(self.clone(), shutdown.clone()))
    }

    /// Register the cancellation token of a submission about to be claimed
    pub(crate) fn register(
        &self,
        submission_id: Uuid,
        shutdown: &CancellationToken,
    ) -> CancellationToken {
        let token = shutdown.child_token();
        self.in_flight().insert(submission_id, token.clone());
        token
    }

    pub(crate) fn unregister(&self, submission_id: Uuid) {
        self.in_flight().remove(&submission_id);
    }

    /// Signal the worker judging a submission to abort
    pub(crate) fn cancel(&self, submission_id: Uuid) -> bool {
        match self.in_flight().remove(&submission_id) {
            Some(token) => {
                debug!(submission_id = %submission_id, "Cancelling in-flight submission");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    /// Whether a worker currently holds the submission
    pub fn is_in_flight(&self, submission_id: Uuid) -> bool {
        self.in_flight().contains_key(&submission_id)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
