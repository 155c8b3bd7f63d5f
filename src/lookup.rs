//! Moderator and flair lookup collaborator.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::relay::types::ItemKind;

/// One flair template: opaque id plus display text.
#[derive(Debug, Clone)]
pub struct FlairTemplate {
    pub id: String,
    pub text: String,
}

/// Read-only subreddit lookup service.
///
/// Backed by the platform API in production; failures are degraded by
/// callers to "rule does not match", never escalated to a fatal error.
#[async_trait]
pub trait SubredditLookup: Send + Sync {
    async fn is_moderator(&self, username: &str) -> Result<bool, LookupError>;

    async fn user_flair_templates(&self) -> Result<Vec<FlairTemplate>, LookupError>;

    async fn post_flair_templates(&self) -> Result<Vec<FlairTemplate>, LookupError>;

    /// Current removal status of an item, checked live at deferred-fire and
    /// approval-retry time (status can change after the creation snapshot).
    async fn is_item_removed(&self, id: &str, kind: ItemKind) -> Result<bool, LookupError>;
}

/// Flair-template-id → display-text map.
///
/// Items sometimes carry only a template id and no literal flair text; the
/// catalog resolves those references. Built lazily by the router, and only
/// when at least one configured rule mentions flairs.
#[derive(Debug, Clone, Default)]
pub struct FlairCatalog {
    user_flairs: HashMap<String, String>,
    post_flairs: HashMap<String, String>,
}

impl FlairCatalog {
    /// Empty catalog, for configs with no flair rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch both template listings from the lookup service.
    ///
    /// A listing failure leaves that half of the catalog empty: template-id
    /// references then resolve to nothing, which downgrades the affected
    /// rule to "no match" per the error-handling contract.
    pub async fn build(lookup: &dyn SubredditLookup) -> Self {
        let user_flairs = match lookup.user_flair_templates().await {
            Ok(templates) => index_templates(templates),
            Err(e) => {
                tracing::warn!(error = %e, "User flair template listing failed; catalog left empty");
                HashMap::new()
            }
        };
        let post_flairs = match lookup.post_flair_templates().await {
            Ok(templates) => index_templates(templates),
            Err(e) => {
                tracing::warn!(error = %e, "Post flair template listing failed; catalog left empty");
                HashMap::new()
            }
        };
        Self {
            user_flairs,
            post_flairs,
        }
    }

    /// Resolve a user-flair template id to its display text.
    pub fn user_flair_text(&self, template_id: &str) -> Option<&str> {
        self.user_flairs.get(template_id).map(String::as_str)
    }

    /// Resolve a post-flair template id to its display text.
    pub fn post_flair_text(&self, template_id: &str) -> Option<&str> {
        self.post_flairs.get(template_id).map(String::as_str)
    }

    #[cfg(test)]
    pub fn with_user_flair(mut self, id: &str, text: &str) -> Self {
        self.user_flairs.insert(id.into(), text.into());
        self
    }

    #[cfg(test)]
    pub fn with_post_flair(mut self, id: &str, text: &str) -> Self {
        self.post_flairs.insert(id.into(), text.into());
        self
    }
}

fn index_templates(templates: Vec<FlairTemplate>) -> HashMap<String, String> {
    templates.into_iter().map(|t| (t.id, t.text)).collect()
}
