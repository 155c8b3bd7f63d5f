//! Backend-agnostic state-store trait.
//!
//! One record per item id with three boolean flags. Writes are partial
//! merges: unspecified fields keep their stored value. The backend must make
//! single-id read and merge-write atomic with respect to concurrent access
//! on the same id; no multi-item transactions are needed.

use async_trait::async_trait;

use crate::error::StateError;

/// The persisted fields of an item's delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    /// Filter verdict recorded at creation time.
    ShouldRelay,
    /// A deferred delivery job has been registered.
    Scheduled,
    /// Delivery completed. Terminal: never attempted again once set.
    Relayed,
}

/// Item State Store collaborator.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read one flag. `None` means the field was never written for this id.
    async fn get_flag(&self, id: &str, field: StateField) -> Result<Option<bool>, StateError>;

    /// Merge-write the given flags for one id, leaving others untouched.
    /// Creates the record on first write.
    async fn merge_flags(&self, id: &str, fields: &[(StateField, bool)])
        -> Result<(), StateError>;
}
