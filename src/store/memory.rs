//! In-memory state-store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StateError;
use crate::store::traits::{StateField, StateStore};

#[derive(Debug, Clone, Copy, Default)]
struct ItemFlags {
    should_relay: Option<bool>,
    scheduled: Option<bool>,
    relayed: Option<bool>,
}

impl ItemFlags {
    fn get(&self, field: StateField) -> Option<bool> {
        match field {
            StateField::ShouldRelay => self.should_relay,
            StateField::Scheduled => self.scheduled,
            StateField::Relayed => self.relayed,
        }
    }

    fn set(&mut self, field: StateField, value: bool) {
        match field {
            StateField::ShouldRelay => self.should_relay = Some(value),
            StateField::Scheduled => self.scheduled = Some(value),
            StateField::Relayed => self.relayed = Some(value),
        }
    }
}

/// HashMap-backed store. The whole-map lock gives per-id atomicity for free;
/// entries live for the process lifetime (expiry is a real backend's concern).
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    items: RwLock<HashMap<String, ItemFlags>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_flag(&self, id: &str, field: StateField) -> Result<Option<bool>, StateError> {
        Ok(self.items.read().await.get(id).and_then(|f| f.get(field)))
    }

    async fn merge_flags(
        &self,
        id: &str,
        fields: &[(StateField, bool)],
    ) -> Result<(), StateError> {
        let mut items = self.items.write().await;
        let flags = items.entry(id.to_string()).or_default();
        for (field, value) in fields {
            flags.set(*field, *value);
        }
        Ok(())
    }
}
