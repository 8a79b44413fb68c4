//! Fair submission queue
//!
//! Each user gets a FIFO; a rotation of users decides who is served next.
//! Dispatch takes the head of the next user in rotation, so a burst from one
//! user interleaves with everyone else's submissions instead of starving
//! them, and each user's own submissions keep their order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A submission waiting to be judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedJob {
    pub submission_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Default)]
struct Lanes {
    per_user: HashMap<Uuid, VecDeque<Uuid>>,
    rotation: VecDeque<Uuid>,
    len: usize,
}

/// Round-robin over per-user FIFOs
#[derive(Debug, Default)]
pub struct FairQueue {
    lanes: Mutex<Lanes>,
    notify: Notify,
}

impl FairQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lanes(&self) -> MutexGuard<'_, Lanes> {
        // Queue state is plain data; a panic elsewhere cannot leave it half-updated
        self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a job to its user's FIFO
    pub fn push(&self, job: QueuedJob) {
        {
            let mut lanes = self.lanes();
            let lane = lanes.per_user.entry(job.user_id).or_default();
            let was_idle = lane.is_empty();
            lane.push_back(job.submission_id);
            if was_idle {
                lanes.rotation.push_back(job.user_id);
            }
            lanes.len += 1;
        }
        self.notify.notify_one();
    }

    /// Take the next job in round-robin order
    pub fn pop(&self) -> Option<QueuedJob> {
        let mut lanes = self.lanes();

        while let Some(user_id) = lanes.rotation.pop_front() {
            let Some(lane) = lanes.per_user.get_mut(&user_id) else {
                continue;
            };
            let Some(submission_id) = lane.pop_front() else {
                lanes.per_user.remove(&user_id);
                continue;
            };

            if lane.is_empty() {
                lanes.per_user.remove(&user_id);
            } else {
                lanes.rotation.push_back(user_id);
            }
            lanes.len -= 1;

            return Some(QueuedJob {
                submission_id,
                user_id,
            });
        }

        None
    }

    /// Wait for the next job; `None` once `shutdown` fires
    pub async fn next(&self, shutdown: &CancellationToken) -> Option<QueuedJob> {
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.pop() {
                // Another job may be waiting for another worker
                if !self.is_empty() {
                    self.notify.notify_one();
                }
                return Some(job);
            }

            tokio::select! {
                _ = notified => {}
                _ = shutdown.cancelled() => return None,
            }
        }
    }

    /// Remove a job that has not been dispatched yet
    pub fn remove(&self, job: &QueuedJob) -> bool {
        let mut lanes = self.lanes();

        let Some(lane) = lanes.per_user.get_mut(&job.user_id) else {
            return false;
        };
        let Some(position) = lane.iter().position(|id| *id == job.submission_id) else {
            return false;
        };

        lane.remove(position);
        if lane.is_empty() {
            lanes.per_user.remove(&job.user_id);
            lanes.rotation.retain(|id| *id != job.user_id);
        }
        lanes.len -= 1;

        true
    }

    pub fn contains(&self, job: &QueuedJob) -> bool {
        self.lanes()
            .per_user
            .get(&job.user_id)
            .is_some_and(|lane| lane.contains(&job.submission_id))
    }

    pub fn len(&self) -> usize {
        self.lanes().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn job(user_id: Uuid) -> QueuedJob {
        QueuedJob {
            submission_id: Uuid::new_v4(),
            user_id,
        }
    }

    #[test]
    fn test_burst_does_not_starve_other_users() {
        let queue = FairQueue::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let alice_jobs: Vec<_> = (0..3).map(|_| job(alice)).collect();
        for j in &alice_jobs {
            queue.push(*j);
        }
        let bob_job = job(bob);
        queue.push(bob_job);

        assert_eq!(queue.pop(), Some(alice_jobs[0]));
        assert_eq!(queue.pop(), Some(bob_job));
        assert_eq!(queue.pop(), Some(alice_jobs[1]));
        assert_eq!(queue.pop(), Some(alice_jobs[2]));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_queued_job() {
        let queue = FairQueue::new();
        let user = Uuid::new_v4();
        let (first, second) = (job(user), job(user));
        queue.push(first);
        queue.push(second);

        assert!(queue.remove(&first));
        assert!(!queue.remove(&first));
        assert!(!queue.contains(&first));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(second));
    }

    #[test]
    fn test_removing_last_job_drops_user_from_rotation() {
        let queue = FairQueue::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let alice_job = job(alice);
        let bob_job = job(bob);
        queue.push(alice_job);
        queue.push(bob_job);

        queue.remove(&alice_job);
        // Re-queued user goes to the back of the rotation
        let alice_again = job(alice);
        queue.push(alice_again);

        assert_eq!(queue.pop(), Some(bob_job));
        assert_eq!(queue.pop(), Some(alice_again));
    }

    #[tokio::test]
    async fn test_next_wakes_on_push() {
        let queue = Arc::new(FairQueue::new());
        let shutdown = CancellationToken::new();

        let waiter = {
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { queue.next(&shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let pushed = job(Uuid::new_v4());
        queue.push(pushed);

        assert_eq!(waiter.await.unwrap(), Some(pushed));
    }

    #[tokio::test]
    async fn test_next_returns_none_on_shutdown() {
        let queue = FairQueue::new();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        assert_eq!(queue.next(&shutdown).await, None);
    }
}
