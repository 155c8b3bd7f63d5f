//! Delay Scheduler — immediate vs deferred delivery.
//!
//! Delay values are validated at configuration entry (`0` or ≥ 3 minutes),
//! not here. A `scheduled=true` flag guards against double-scheduling on
//! duplicate trigger delivery; the read-then-write race it leaves open can
//! at worst duplicate one notification, never corrupt state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::Result;
use crate::jobs::JobQueue;
use crate::lookup::SubredditLookup;
use crate::relay::dispatcher::RelayDispatcher;
use crate::relay::types::{ContentItem, ItemKind, RelayJob};
use crate::store::{StateField, StateStore};

/// What the scheduler did with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Delivered synchronously (no delay, or retry with delay skipped).
    Delivered,
    /// A deferred job was registered.
    Scheduled,
    /// A deferred job already existed; nothing was registered.
    AlreadyScheduled,
    /// Removal-ignore gate held; `relayed` stays false.
    Suppressed,
}

pub struct DelayScheduler {
    dispatcher: Arc<RelayDispatcher>,
    store: Arc<dyn StateStore>,
    lookup: Arc<dyn SubredditLookup>,
    queue: Arc<dyn JobQueue>,
}

impl DelayScheduler {
    pub fn new(
        dispatcher: Arc<RelayDispatcher>,
        store: Arc<dyn StateStore>,
        lookup: Arc<dyn SubredditLookup>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            lookup,
            queue,
        }
    }

    /// Deliver now or register a deferred job.
    ///
    /// `skip_delay` is set on the approval-retry path: the delay existed to
    /// await moderation, which has concluded, so retries deliver immediately.
    /// That path also re-checks removal against the item's *current* status
    /// instead of the creation-time snapshot.
    pub async fn schedule_or_run_now(
        &self,
        item: &ContentItem,
        config: &RelayConfig,
        skip_delay: bool,
    ) -> Result<ScheduleOutcome> {
        let delay_minutes = if skip_delay {
            0
        } else {
            config.delay_minutes_for(item.kind)
        };

        if delay_minutes == 0 {
            let removed = if skip_delay {
                self.currently_removed(&item.id, item.kind).await
            } else {
                item.is_removed()
            };
            if config.ignore_removed && removed {
                info!(item_id = %item.log_id(), "Item removed; delivery suppressed");
                return Ok(ScheduleOutcome::Suppressed);
            }
            self.dispatcher.deliver_item(item, config).await?;
            return Ok(ScheduleOutcome::Delivered);
        }

        if self
            .store
            .get_flag(&item.id, StateField::Scheduled)
            .await?
            .unwrap_or(false)
        {
            debug!(item_id = %item.log_id(), "Delivery already scheduled; skipping");
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        let run_at = Utc::now() + Duration::minutes(i64::from(delay_minutes));
        let job = RelayJob {
            item_id: item.id.clone(),
            kind: item.kind,
            content: RelayDispatcher::render(item, config),
            webhook_url: config.webhook_url.expose_secret().to_string(),
            ignore_removed: config.ignore_removed,
        };
        self.queue.schedule_at(run_at, job).await?;
        self.store
            .merge_flags(&item.id, &[(StateField::Scheduled, true)])
            .await?;
        info!(
            item_id = %item.log_id(),
            run_at = %run_at,
            delay_minutes,
            "Delivery scheduled"
        );
        Ok(ScheduleOutcome::Scheduled)
    }

    /// Deferred-job firing: runs in its own invocation context, long after
    /// scheduling. Re-checks the removal gate against current item status
    /// (the item may have been removed in the meantime) and the dedup guard,
    /// then delivers the pre-rendered content.
    pub async fn run_deferred(&self, job: RelayJob) -> Result<ScheduleOutcome> {
        if self
            .store
            .get_flag(&job.item_id, StateField::Relayed)
            .await?
            .unwrap_or(false)
        {
            debug!(item_id = %job.item_id, "Already relayed before deferred fire; skipping");
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }

        if job.ignore_removed && self.currently_removed(&job.item_id, job.kind).await {
            info!(item_id = %job.item_id, "Item removed before deferred fire; delivery suppressed");
            return Ok(ScheduleOutcome::Suppressed);
        }

        self.dispatcher
            .deliver_content(&job.item_id, &job.content, &job.webhook_url)
            .await?;
        Ok(ScheduleOutcome::Delivered)
    }

    /// Live removal status, with the lookup-failure fallback: an unreachable
    /// status check never blocks delivery.
    async fn currently_removed(&self, id: &str, kind: ItemKind) -> bool {
        match self.lookup.is_item_removed(id, kind).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(item_id = %id, error = %e, "Removal-status lookup failed; treating as not removed");
                false
            }
        }
    }
}

/// The scheduler owns the deferred-firing callback.
#[async_trait::async_trait]
impl crate::jobs::JobHandler for DelayScheduler {
    async fn run(&self, job: RelayJob) {
        if let Err(e) = self.run_deferred(job).await {
            tracing::error!(error = %e, "Deferred delivery failed");
        }
    }
}
