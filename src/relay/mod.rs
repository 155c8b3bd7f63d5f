//! The relay decision and delayed-delivery pipeline.

pub mod dispatcher;
pub mod router;
pub mod rules;
pub mod scheduler;
pub mod types;

pub use dispatcher::RelayDispatcher;
pub use router::EventRouter;
pub use rules::FilterEvaluator;
pub use scheduler::{DelayScheduler, ScheduleOutcome};
pub use types::{ContentItem, InboundEvent, ItemKind, RelayJob};
