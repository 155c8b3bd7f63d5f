//! Reddit-backed lookup collaborator.
//!
//! Talks to the public subreddit JSON endpoints. Callers already treat any
//! failure here as "rule does not match", so this client only maps transport
//! and shape problems into [`LookupError`] and leaves policy to them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LookupError;
use crate::lookup::{FlairTemplate, SubredditLookup};
use crate::relay::types::ItemKind;

const REDDIT_BASE: &str = "https://www.reddit.com";

pub struct RedditClient {
    subreddit: String,
    user_agent: String,
    client: reqwest::Client,
}

impl RedditClient {
    pub fn new(subreddit: String) -> Self {
        Self {
            user_agent: format!("discord-relay/{} (r/{subreddit})", env!("CARGO_PKG_VERSION")),
            subreddit,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{REDDIT_BASE}/r/{}/{path}", self.subreddit)
    }

    async fn get_json(&self, url: &str) -> Result<Value, LookupError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| LookupError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::RequestFailed(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }

    async fn flair_templates(&self, path: &str) -> Result<Vec<FlairTemplate>, LookupError> {
        let listing = self.get_json(&self.api_url(path)).await?;
        let entries = listing
            .as_array()
            .ok_or_else(|| LookupError::InvalidResponse("flair listing is not an array".into()))?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let id = entry.get("id")?.as_str()?;
                let text = entry.get("text")?.as_str()?;
                Some(FlairTemplate {
                    id: id.to_string(),
                    text: text.to_string(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SubredditLookup for RedditClient {
    async fn is_moderator(&self, username: &str) -> Result<bool, LookupError> {
        let listing = self
            .get_json(&self.api_url("about/moderators.json"))
            .await?;
        let moderators = listing
            .pointer("/data/children")
            .and_then(Value::as_array)
            .ok_or_else(|| LookupError::InvalidResponse("moderator listing shape".into()))?;

        let username = username.to_lowercase();
        Ok(moderators.iter().any(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase() == username)
        }))
    }

    async fn user_flair_templates(&self) -> Result<Vec<FlairTemplate>, LookupError> {
        self.flair_templates("api/user_flair_v2.json").await
    }

    async fn post_flair_templates(&self) -> Result<Vec<FlairTemplate>, LookupError> {
        self.flair_templates("api/link_flair_v2.json").await
    }

    async fn is_item_removed(&self, id: &str, _kind: ItemKind) -> Result<bool, LookupError> {
        let url = format!("{REDDIT_BASE}/api/info.json?id={id}");
        let listing = self.get_json(&url).await?;
        let data = listing
            .pointer("/data/children/0/data")
            .ok_or_else(|| LookupError::InvalidResponse(format!("no info for item {id}")))?;

        let removed_by_category = data
            .get("removed_by_category")
            .is_some_and(|v| !v.is_null());
        let banned = data.get("banned_by").is_some_and(|v| !v.is_null());
        Ok(removed_by_category || banned)
    }
}
