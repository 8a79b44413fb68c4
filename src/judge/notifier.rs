//! Verdict notifications
//!
//! Every terminal outcome becomes a [`JudgeEvent`]. Events are broadcast
//! in-process to subscribers and, when Redis is configured, published as
//! JSON on [`EVENTS_CHANNEL`] for other services. Publishing is best effort:
//! a failed publish is logged and never fails the judging pipeline.

use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    constants::{EVENTS_CHANNEL, EVENT_BUFFER_SIZE},
    models::{FailureReason, Verdict},
};

/// Notification about a submission reaching a terminal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeEvent {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    #[serde(flatten)]
    pub outcome: EventOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventOutcome {
    VerdictReady { verdict: Verdict },
    Failed { reason: FailureReason },
}

/// Fan-out for judge events
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<JudgeEvent>,
    redis: Option<ConnectionManager>,
}

impl Notifier {
    /// In-process notifications only
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            sender,
            redis: None,
        }
    }

    /// Also publish every event to Redis
    pub fn with_redis(redis: ConnectionManager) -> Self {
        Self {
            redis: Some(redis),
            ..Self::new()
        }
    }

    /// Connect to Redis when a URL is configured
    pub async fn connect(redis_url: Option<&str>) -> Result<Self, redis::RedisError> {
        match redis_url {
            Some(url) => {
                tracing::info!("Connecting to Redis...");
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Ok(Self::with_redis(manager))
            }
            None => Ok(Self::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JudgeEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to every subscriber
    pub async fn notify(&self, event: JudgeEvent) {
        if let Some(redis) = &self.redis {
            self.publish(redis.clone(), &event).await;
        }

        // Err only means nobody is listening right now
        if self.sender.send(event).is_err() {
            debug!("No in-process subscribers for judge event");
        }
    }

    async fn publish(&self, mut redis: ConnectionManager, event: &JudgeEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(submission_id = %event.submission_id, error = %e, "Failed to encode judge event");
                return;
            }
        };

        let published: Result<i64, redis::RedisError> = redis::cmd("PUBLISH")
            .arg(EVENTS_CHANNEL)
            .arg(payload)
            .query_async(&mut redis)
            .await;

        if let Err(e) = published {
            warn!(submission_id = %event.submission_id, error = %e, "Failed to publish judge event");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
