//! Relay configuration and the settings collaborator.
//!
//! The settings store is external (a per-community key/value surface edited
//! by moderators). The router reads it once per inbound event and builds one
//! immutable [`RelayConfig`] that is passed by value into every component —
//! nothing downstream reaches back into the store.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::relay::types::ItemKind;

/// Smallest non-zero delivery delay, in minutes. Delays exist to give
/// moderators a review window; anything shorter than this is useless for
/// that and is rejected at configuration entry.
pub const MIN_DELAY_MINUTES: u32 = 3;

/// Filter token meaning "any current subreddit moderator" rather than a
/// literal username.
pub const MODERATOR_SENTINEL: &str = "m";

/// Read-only settings collaborator, keyed by option name.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_string(&self, name: &str) -> Result<Option<String>, ConfigError>;
    async fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError>;
    async fn get_int(&self, name: &str) -> Result<Option<i64>, ConfigError>;
}

/// Which content kinds the relay forwards at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeFilter {
    All,
    PostsOnly,
    CommentsOnly,
}

impl ContentTypeFilter {
    /// Parse the `content-type` setting value (`all` / `post` / `comment`).
    pub fn from_setting(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "post" => Ok(Self::PostsOnly),
            "comment" => Ok(Self::CommentsOnly),
            other => Err(ConfigError::InvalidValue {
                key: "content-type".into(),
                message: format!("expected all/post/comment, got {other:?}"),
            }),
        }
    }

    pub fn allows(&self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::PostsOnly => kind == ItemKind::Post,
            Self::CommentsOnly => kind == ItemKind::Comment,
        }
    }
}

/// A username rule: literal names plus an optional "all moderators" match.
///
/// Parsed from a comma-separated list; the token `m` is the moderator
/// sentinel. Names are stored lowercased, comparisons are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct UserMatcher {
    pub names: Vec<String>,
    pub include_moderators: bool,
}

impl UserMatcher {
    /// Parse a raw setting value. Returns `None` when no usable token remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut matcher = Self::default();
        for token in split_list(raw) {
            if token == MODERATOR_SENTINEL {
                matcher.include_moderators = true;
            } else {
                matcher.names.push(token);
            }
        }
        if matcher.names.is_empty() && !matcher.include_moderators {
            None
        } else {
            Some(matcher)
        }
    }

    /// Literal-name match (case-insensitive). Moderator membership is the
    /// caller's concern since it needs a network lookup.
    pub fn matches_name(&self, author: &str) -> bool {
        let author = author.to_lowercase();
        self.names.iter().any(|n| *n == author)
    }
}

/// Immutable per-event relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub webhook_url: SecretString,
    pub content_type: ContentTypeFilter,
    pub include_users: Option<UserMatcher>,
    pub exclude_users: Option<UserMatcher>,
    pub include_user_flairs: Vec<String>,
    pub exclude_user_flairs: Vec<String>,
    pub include_post_flairs: Vec<String>,
    pub exclude_post_flairs: Vec<String>,
    pub post_delay_minutes: u32,
    pub comment_delay_minutes: u32,
    pub ignore_removed: bool,
    pub retry_on_approval: bool,
    pub ping_role_id: Option<String>,
}

impl RelayConfig {
    /// Build a config snapshot from the settings collaborator.
    ///
    /// A missing webhook URL aborts processing of the current event; every
    /// other option has a permissive default.
    pub async fn load(settings: &dyn SettingsStore) -> Result<Self, ConfigError> {
        let webhook_url = settings
            .get_string("webhook-url")
            .await?
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "webhook-url".into(),
                hint: "Enter the Discord webhook URL in the relay settings.".into(),
            })?;

        let content_type = match settings.get_string("content-type").await? {
            Some(raw) if !raw.trim().is_empty() => ContentTypeFilter::from_setting(&raw)?,
            _ => ContentTypeFilter::All,
        };

        let ping_role_id = if settings.get_bool("ping-role").await?.unwrap_or(false) {
            settings
                .get_string("ping-role-id")
                .await?
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
        } else {
            None
        };

        let include_users = load_user_matcher(settings, "include-users").await?;
        let exclude_users = load_user_matcher(settings, "exclude-users").await?;

        Ok(Self {
            webhook_url: SecretString::from(webhook_url),
            content_type,
            include_users,
            exclude_users,
            include_user_flairs: load_list(settings, "include-user-flairs").await?,
            exclude_user_flairs: load_list(settings, "exclude-user-flairs").await?,
            include_post_flairs: load_list(settings, "include-post-flairs").await?,
            exclude_post_flairs: load_list(settings, "exclude-post-flairs").await?,
            post_delay_minutes: load_delay(settings, "post-delay-minutes").await?,
            comment_delay_minutes: load_delay(settings, "comment-delay-minutes").await?,
            ignore_removed: settings.get_bool("ignore-removed").await?.unwrap_or(false),
            retry_on_approval: settings
                .get_bool("retry-on-approval")
                .await?
                .unwrap_or(false),
            ping_role_id,
        })
    }

    /// Delivery delay for an item kind, in minutes.
    pub fn delay_minutes_for(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Post => self.post_delay_minutes,
            ItemKind::Comment => self.comment_delay_minutes,
        }
    }

    /// True when any configured rule needs flair-template resolution.
    pub fn references_flairs(&self) -> bool {
        !self.include_user_flairs.is_empty()
            || !self.exclude_user_flairs.is_empty()
            || !self.include_post_flairs.is_empty()
            || !self.exclude_post_flairs.is_empty()
    }
}

/// Validate a delay setting: `0` (no delay) or at least [`MIN_DELAY_MINUTES`].
///
/// Called at configuration entry; the scheduler does not re-validate.
pub fn validate_delay(key: &str, minutes: i64) -> Result<u32, ConfigError> {
    if minutes < 0 {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("delay cannot be negative, got {minutes}"),
        });
    }
    let minutes = minutes as u32;
    if minutes != 0 && minutes < MIN_DELAY_MINUTES {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("delay must be 0 or at least {MIN_DELAY_MINUTES} minutes"),
        });
    }
    Ok(minutes)
}

/// Split a comma-separated setting value: trim tokens, drop empties,
/// lowercase for case-insensitive comparison.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

async fn load_list(
    settings: &dyn SettingsStore,
    name: &str,
) -> Result<Vec<String>, ConfigError> {
    Ok(settings
        .get_string(name)
        .await?
        .map(|raw| split_list(&raw))
        .unwrap_or_default())
}

async fn load_user_matcher(
    settings: &dyn SettingsStore,
    name: &str,
) -> Result<Option<UserMatcher>, ConfigError> {
    Ok(settings
        .get_string(name)
        .await?
        .and_then(|raw| UserMatcher::parse(&raw)))
}

async fn load_delay(settings: &dyn SettingsStore, name: &str) -> Result<u32, ConfigError> {
    match settings.get_int(name).await? {
        Some(minutes) => validate_delay(name, minutes),
        None => Ok(0),
    }
}

// ── Backends ────────────────────────────────────────────────────────

/// A typed setting value for the in-memory backend.
#[derive(Debug, Clone)]
pub enum SettingValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

/// In-memory settings backend. Used in tests and as a fixed-config wiring.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, SettingValue>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_str(mut self, name: &str, value: &str) -> Self {
        self.values
            .insert(name.into(), SettingValue::Str(value.into()));
        self
    }

    pub fn with_bool(mut self, name: &str, value: bool) -> Self {
        self.values.insert(name.into(), SettingValue::Bool(value));
        self
    }

    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.values.insert(name.into(), SettingValue::Int(value));
        self
    }
}

#[async_trait]
impl SettingsStore for StaticSettings {
    async fn get_string(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(name).map(|v| match v {
            SettingValue::Str(s) => s.clone(),
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::Int(i) => i.to_string(),
        }))
    }

    async fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        Ok(self.values.get(name).and_then(|v| match v {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Str(s) => s.parse().ok(),
            SettingValue::Int(i) => Some(*i != 0),
        }))
    }

    async fn get_int(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        Ok(self.values.get(name).and_then(|v| match v {
            SettingValue::Int(i) => Some(*i),
            SettingValue::Str(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }))
    }
}

/// Environment-variable settings backend: `webhook-url` → `RELAY_WEBHOOK_URL`.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings;

impl EnvSettings {
    fn var(name: &str) -> Option<String> {
        let key = format!("RELAY_{}", name.to_uppercase().replace('-', "_"));
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl SettingsStore for EnvSettings {
    async fn get_string(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(Self::var(name))
    }

    async fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        match Self::var(name) {
            None => Ok(None),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                other => Err(ConfigError::InvalidValue {
                    key: name.into(),
                    message: format!("expected a boolean, got {other:?}"),
                }),
            },
        }
    }

    async fn get_int(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match Self::var(name) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                ConfigError::InvalidValue {
                    key: name.into(),
                    message: format!("expected an integer, got {raw:?}"),
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_zero_and_minimum_accepted() {
        assert_eq!(validate_delay("post-delay-minutes", 0).unwrap(), 0);
        assert_eq!(validate_delay("post-delay-minutes", 3).unwrap(), 3);
        assert_eq!(validate_delay("post-delay-minutes", 45).unwrap(), 45);
    }

    #[test]
    fn delay_below_minimum_rejected() {
        assert!(validate_delay("post-delay-minutes", 1).is_err());
        assert!(validate_delay("comment-delay-minutes", 2).is_err());
        assert!(validate_delay("comment-delay-minutes", -5).is_err());
    }

    #[test]
    fn list_parsing_trims_and_lowercases() {
        assert_eq!(
            split_list(" Contest-Winner , helper,,  ,VIP "),
            vec!["contest-winner", "helper", "vip"]
        );
        assert!(split_list("  ,, ").is_empty());
    }

    #[test]
    fn user_matcher_picks_up_moderator_sentinel() {
        let matcher = UserMatcher::parse("alice, M, bob").unwrap();
        assert!(matcher.include_moderators);
        assert_eq!(matcher.names, vec!["alice", "bob"]);
        assert!(matcher.matches_name("Alice"));
        assert!(!matcher.matches_name("mallory"));
    }

    #[test]
    fn user_matcher_empty_input_is_none() {
        assert!(UserMatcher::parse("  , ,").is_none());
    }

    #[test]
    fn content_type_parses_setting_values() {
        assert_eq!(
            ContentTypeFilter::from_setting("all").unwrap(),
            ContentTypeFilter::All
        );
        assert_eq!(
            ContentTypeFilter::from_setting(" Post ").unwrap(),
            ContentTypeFilter::PostsOnly
        );
        assert!(ContentTypeFilter::from_setting("links").is_err());
    }

    #[tokio::test]
    async fn load_requires_webhook_url() {
        let settings = StaticSettings::new();
        let err = RelayConfig::load(&settings).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "webhook-url"));
    }

    #[tokio::test]
    async fn load_builds_full_config() {
        let settings = StaticSettings::new()
            .with_str("webhook-url", "https://discord.com/api/webhooks/1/abc")
            .with_str("content-type", "post")
            .with_bool("ping-role", true)
            .with_str("ping-role-id", "424242")
            .with_str("exclude-users", "m, spambot")
            .with_str("include-post-flairs", "News, Meta")
            .with_int("post-delay-minutes", 5)
            .with_bool("ignore-removed", true)
            .with_bool("retry-on-approval", true);

        let config = RelayConfig::load(&settings).await.unwrap();
        assert_eq!(config.content_type, ContentTypeFilter::PostsOnly);
        assert_eq!(config.ping_role_id.as_deref(), Some("424242"));
        assert!(config.exclude_users.as_ref().unwrap().include_moderators);
        assert_eq!(config.include_post_flairs, vec!["news", "meta"]);
        assert_eq!(config.post_delay_minutes, 5);
        assert_eq!(config.comment_delay_minutes, 0);
        assert!(config.ignore_removed);
        assert!(config.retry_on_approval);
        assert!(config.references_flairs());
    }

    #[tokio::test]
    async fn ping_role_id_ignored_when_ping_disabled() {
        let settings = StaticSettings::new()
            .with_str("webhook-url", "https://discord.com/api/webhooks/1/abc")
            .with_bool("ping-role", false)
            .with_str("ping-role-id", "424242");
        let config = RelayConfig::load(&settings).await.unwrap();
        assert!(config.ping_role_id.is_none());
    }
}
