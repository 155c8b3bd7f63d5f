//! Deferred-job collaborator.
//!
//! The scheduler hands a serializable [`RelayJob`] to the queue together
//! with a `run_at` instant; the queue invokes the registered handler with
//! the same payload at or after that instant, in its own task. There is no
//! cancellation: a registered job fires unless process state is lost.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::IngestError;
use crate::relay::types::RelayJob;

/// Callback invoked when a deferred job fires. Registered once, at wiring
/// time, by the scheduler side.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, job: RelayJob);
}

/// Deferred-job queue collaborator.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn schedule_at(&self, run_at: DateTime<Utc>, job: RelayJob) -> Result<(), IngestError>;
}

/// Tokio-backed queue: one spawned task per job, sleeping until `run_at`.
///
/// The handler is registered after construction because the scheduler that
/// owns the callback also holds the queue.
#[derive(Default)]
pub struct TokioJobQueue {
    handler: OnceLock<Arc<dyn JobHandler>>,
}

impl TokioJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the firing callback. Later registrations are ignored.
    pub fn register(&self, handler: Arc<dyn JobHandler>) {
        let _ = self.handler.set(handler);
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn schedule_at(&self, run_at: DateTime<Utc>, job: RelayJob) -> Result<(), IngestError> {
        let handler = self
            .handler
            .get()
            .ok_or_else(|| IngestError::ScheduleFailed("no job handler registered".into()))?
            .clone();
        let wait = (run_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let job_id = Uuid::new_v4();

        tracing::debug!(
            job_id = %job_id,
            item_id = %job.item_id,
            run_at = %run_at,
            "Registered deferred delivery job"
        );

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            tracing::debug!(job_id = %job_id, item_id = %job.item_id, "Deferred job firing");
            handler.run(job).await;
        });

        Ok(())
    }
}
