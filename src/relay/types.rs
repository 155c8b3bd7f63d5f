//! Shared types for the relay pipeline.
//!
//! The inbound-event surface hands the router one [`InboundEvent`] — a tagged
//! union over creation and moderation events with fixed, statically-typed
//! fields. Malformed payloads are rejected at deserialization time instead of
//! being poked at field-by-field downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Content items ───────────────────────────────────────────────────

/// Whether an item is a post or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    /// Lowercase noun for message rendering and logs.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

/// Removal signals as reported by the content platform.
///
/// An item counts as removed when any of these is set; they arrive as
/// separate flags because spam filtering, moderator removal, AutoMod bans,
/// and legal takedowns are distinct actions upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemovalFlags {
    #[serde(default)]
    pub spam: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub removal_category: Option<String>,
    #[serde(default)]
    pub banned_by_automod: bool,
    #[serde(default)]
    pub legal_removed: bool,
}

impl RemovalFlags {
    pub fn any(&self) -> bool {
        self.spam
            || self.removed
            || self.removal_category.is_some()
            || self.banned_by_automod
            || self.legal_removed
    }
}

/// A post or comment as seen by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable unique id; the storage key for delivery state.
    pub id: String,
    pub kind: ItemKind,
    /// Parent post id, set for comments. Used for log identity only.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub author_name: String,
    /// Absolute URL of the author's profile.
    pub author_url: String,
    /// Site-relative permalink, e.g. `/r/example/comments/abc/....`.
    pub permalink: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub removal: RemovalFlags,
    #[serde(default)]
    pub user_flair_text: Option<String>,
    #[serde(default)]
    pub user_flair_template_id: Option<String>,
    /// Post flair; never set on comments.
    #[serde(default)]
    pub post_flair_text: Option<String>,
    #[serde(default)]
    pub post_flair_template_id: Option<String>,
}

impl ContentItem {
    /// Derived removal status at the time this snapshot was taken.
    pub fn is_removed(&self) -> bool {
        self.removal.any()
    }

    /// Identity for logs: comments carry their parent post id too.
    pub fn log_id(&self) -> String {
        match (&self.parent_id, self.kind) {
            (Some(parent), ItemKind::Comment) => format!("({parent}, {})", self.id),
            _ => self.id.clone(),
        }
    }
}

// ── Inbound events ──────────────────────────────────────────────────

/// A new post or comment, as delivered by the trigger source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationEvent {
    pub item: ContentItem,
}

/// Moderation actions the relay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModAction {
    /// Post approval (`approvelink` on the wire).
    #[serde(rename = "approvelink")]
    ApprovePost,
    /// Comment approval (`approvecomment` on the wire).
    #[serde(rename = "approvecomment")]
    ApproveComment,
}

impl ModAction {
    pub fn target_kind(&self) -> ItemKind {
        match self {
            Self::ApprovePost => ItemKind::Post,
            Self::ApproveComment => ItemKind::Comment,
        }
    }
}

/// A moderation event targeting a previously seen item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub action: ModAction,
    /// The approved post or comment, as it stands after approval.
    pub target: ContentItem,
}

/// The inbound event union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Creation(CreationEvent),
    Moderation(ModerationEvent),
}

// ── Deferred delivery ───────────────────────────────────────────────

/// Serializable payload for a deferred delivery job.
///
/// Everything the firing side needs crosses the suspension boundary in this
/// struct — no closures, no shared in-memory state. The message is rendered
/// at schedule time; only the removal status is re-checked live at fire time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayJob {
    pub item_id: String,
    pub kind: ItemKind,
    /// Fully rendered message content, role ping included.
    pub content: String,
    pub webhook_url: String,
    /// `ignore-removed` snapshot from the config that scheduled this job.
    pub ignore_removed: bool,
}
