//! Event Router — top-level entry point for inbound events.
//!
//! Each invocation is independent and unordered; the host may run many
//! concurrently. The router builds one [`RelayConfig`] snapshot per event,
//! and every failure is terminal for that event only — logged, never
//! returned to the trigger source as a retry signal.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::{RelayConfig, SettingsStore};
use crate::error::Result;
use crate::lookup::{FlairCatalog, SubredditLookup};
use crate::relay::rules::FilterEvaluator;
use crate::relay::scheduler::DelayScheduler;
use crate::relay::types::{CreationEvent, InboundEvent, ModerationEvent};
use crate::store::{StateField, StateStore};

pub struct EventRouter {
    settings: Arc<dyn SettingsStore>,
    lookup: Arc<dyn SubredditLookup>,
    store: Arc<dyn StateStore>,
    evaluator: FilterEvaluator,
    scheduler: Arc<DelayScheduler>,
}

impl EventRouter {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        lookup: Arc<dyn SubredditLookup>,
        store: Arc<dyn StateStore>,
        scheduler: Arc<DelayScheduler>,
    ) -> Self {
        let evaluator = FilterEvaluator::new(lookup.clone());
        Self {
            settings,
            lookup,
            store,
            evaluator,
            scheduler,
        }
    }

    /// Handle one inbound event. Errors are logged here and swallowed: the
    /// trigger source never sees them.
    pub async fn handle_event(&self, event: InboundEvent) {
        let result = match event {
            InboundEvent::Creation(creation) => self.handle_creation(creation).await,
            InboundEvent::Moderation(moderation) => self.handle_approval(moderation).await,
        };
        if let Err(e) = result {
            error!(error = %e, "Event processing aborted");
        }
    }

    /// Creation event: evaluate the filter, persist the verdict, schedule.
    async fn handle_creation(&self, event: CreationEvent) -> Result<()> {
        let item = event.item;
        info!(
            item_id = %item.log_id(),
            kind = item.kind.noun(),
            author = %item.author_name,
            "Received creation event"
        );

        let config = RelayConfig::load(self.settings.as_ref()).await?;

        let already_relayed = self
            .store
            .get_flag(&item.id, StateField::Relayed)
            .await?
            .unwrap_or(false);

        // The catalog needs two listing calls; skip them unless a rule
        // actually mentions flairs.
        let catalog = if config.references_flairs() {
            FlairCatalog::build(self.lookup.as_ref()).await
        } else {
            FlairCatalog::empty()
        };

        let verdict = self
            .evaluator
            .evaluate(&item, &config, &catalog, already_relayed)
            .await;
        self.store
            .merge_flags(&item.id, &[(StateField::ShouldRelay, verdict)])
            .await?;

        if verdict {
            self.scheduler
                .schedule_or_run_now(&item, &config, false)
                .await?;
        } else {
            debug!(item_id = %item.log_id(), "Item filtered out, not relaying");
        }
        Ok(())
    }

    /// Approval event: re-deliver a suppressed or still-pending item.
    ///
    /// Only items whose creation-time verdict was positive and that have not
    /// been delivered yet qualify. The retry skips the configured delay —
    /// the delay existed to await moderation, which has now concluded.
    async fn handle_approval(&self, event: ModerationEvent) -> Result<()> {
        let item = event.target;
        info!(
            item_id = %item.log_id(),
            action = ?event.action,
            "Received approval event"
        );

        let config = RelayConfig::load(self.settings.as_ref()).await?;
        if !config.retry_on_approval {
            debug!(item_id = %item.log_id(), "Approval retry disabled, ignoring");
            return Ok(());
        }

        let should_relay = self
            .store
            .get_flag(&item.id, StateField::ShouldRelay)
            .await?
            .unwrap_or(false);
        let relayed = self
            .store
            .get_flag(&item.id, StateField::Relayed)
            .await?
            .unwrap_or(false);

        if !should_relay || relayed {
            debug!(
                item_id = %item.log_id(),
                should_relay,
                relayed,
                "No retry warranted for approved item"
            );
            return Ok(());
        }

        self.scheduler
            .schedule_or_run_now(&item, &config, true)
            .await?;
        Ok(())
    }
}
