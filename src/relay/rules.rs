//! Filter Evaluator — the relay decision for one item.
//!
//! Evaluation order, first match wins:
//! 1. Content-type gate (posts-only / comments-only)
//! 2. Dedup gate (`relayed` flag, supplied by the caller's state read)
//! 3. Exclusions, fixed order: username-or-moderator, user flair, post flair
//!    (Posts only) — any match forces `false` before inclusions are looked at
//! 4. Inclusions, OR-combined — with none configured the item relays by
//!    default
//!
//! Username and flair comparisons are case-insensitive. Flair rules accept
//! the literal flair text on the item, or the text resolved from the
//! [`FlairCatalog`] when the item only carries a template id.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::lookup::{FlairCatalog, SubredditLookup};
use crate::relay::types::{ContentItem, ItemKind};

/// Stateless relay-decision function over an item and a config snapshot.
///
/// Holds only the moderator-lookup collaborator; all other inputs arrive by
/// value per evaluation.
pub struct FilterEvaluator {
    lookup: Arc<dyn SubredditLookup>,
}

impl FilterEvaluator {
    pub fn new(lookup: Arc<dyn SubredditLookup>) -> Self {
        Self { lookup }
    }

    /// Compute the relay verdict for one item.
    pub async fn evaluate(
        &self,
        item: &ContentItem,
        config: &RelayConfig,
        catalog: &FlairCatalog,
        already_relayed: bool,
    ) -> bool {
        // 1. Content-type gate
        if !config.content_type.allows(item.kind) {
            debug!(item_id = %item.log_id(), kind = item.kind.noun(), "Content type filtered out");
            return false;
        }

        // 2. Dedup gate
        if already_relayed {
            debug!(item_id = %item.log_id(), "Already relayed, skipping");
            return false;
        }

        // 3. Exclusions, each one terminal
        if let Some(excluded) = &config.exclude_users {
            if excluded.matches_name(&item.author_name) {
                debug!(item_id = %item.log_id(), author = %item.author_name, "Author excluded by name");
                return false;
            }
            if excluded.include_moderators && self.author_is_moderator(&item.author_name).await {
                debug!(item_id = %item.log_id(), author = %item.author_name, "Author excluded as moderator");
                return false;
            }
        }
        if !config.exclude_user_flairs.is_empty()
            && user_flair_matches(item, catalog, &config.exclude_user_flairs)
        {
            debug!(item_id = %item.log_id(), "User flair excluded");
            return false;
        }
        if item.kind == ItemKind::Post
            && !config.exclude_post_flairs.is_empty()
            && post_flair_matches(item, catalog, &config.exclude_post_flairs)
        {
            debug!(item_id = %item.log_id(), "Post flair excluded");
            return false;
        }

        // 4. Inclusions: OR across every configured rule
        let mut any_configured = false;
        let mut any_matched = false;

        if let Some(included) = &config.include_users {
            any_configured = true;
            let matched = included.matches_name(&item.author_name)
                || (included.include_moderators
                    && self.author_is_moderator(&item.author_name).await);
            any_matched |= matched;
        }
        if !config.include_user_flairs.is_empty() {
            any_configured = true;
            any_matched |= user_flair_matches(item, catalog, &config.include_user_flairs);
        }
        if item.kind == ItemKind::Post && !config.include_post_flairs.is_empty() {
            any_configured = true;
            any_matched |= post_flair_matches(item, catalog, &config.include_post_flairs);
        }

        let verdict = !any_configured || any_matched;
        debug!(item_id = %item.log_id(), verdict, "Filter verdict");
        verdict
    }

    /// Moderator membership with the lookup-failure fallback: an unreachable
    /// moderator list means "not a moderator" rather than a blocked relay.
    async fn author_is_moderator(&self, author: &str) -> bool {
        match self.lookup.is_moderator(author).await {
            Ok(is_mod) => is_mod,
            Err(e) => {
                warn!(author = %author, error = %e, "Moderator lookup failed; treating as non-moderator");
                false
            }
        }
    }
}

fn user_flair_matches(item: &ContentItem, catalog: &FlairCatalog, wanted: &[String]) -> bool {
    if let Some(text) = &item.user_flair_text {
        if list_contains(wanted, text) {
            return true;
        }
    }
    if let Some(template_id) = &item.user_flair_template_id {
        if let Some(text) = catalog.user_flair_text(template_id) {
            return list_contains(wanted, text);
        }
    }
    false
}

fn post_flair_matches(item: &ContentItem, catalog: &FlairCatalog, wanted: &[String]) -> bool {
    if let Some(text) = &item.post_flair_text {
        if list_contains(wanted, text) {
            return true;
        }
    }
    if let Some(template_id) = &item.post_flair_template_id {
        if let Some(text) = catalog.post_flair_text(template_id) {
            return list_contains(wanted, text);
        }
    }
    false
}

/// `wanted` entries are already lowercased by the config parser.
fn list_contains(wanted: &[String], text: &str) -> bool {
    let text = text.trim().to_lowercase();
    wanted.iter().any(|w| *w == text)
}
