//! Relay Dispatcher — message rendering and webhook delivery.
//!
//! One delivery attempt per schedule firing: a transport failure is logged
//! with status and body and left terminal, so `relayed` stays false and a
//! later approval retry can try again. This is the only component allowed to
//! set the `relayed` flag.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, error, info};

use crate::config::RelayConfig;
use crate::error::Result;
use crate::relay::types::ContentItem;
use crate::store::{StateField, StateStore};
use crate::webhook::{DeliveryTransport, WebhookPayload};

const REDDIT_BASE: &str = "https://www.reddit.com";

pub struct RelayDispatcher {
    transport: Arc<dyn DeliveryTransport>,
    store: Arc<dyn StateStore>,
}

impl RelayDispatcher {
    pub fn new(transport: Arc<dyn DeliveryTransport>, store: Arc<dyn StateStore>) -> Self {
        Self { transport, store }
    }

    /// Render the notification message for an item.
    ///
    /// `New [post](permalink) by [u/author](profile)!`, with a role-mention
    /// line appended when role pings are configured.
    pub fn render(item: &ContentItem, config: &RelayConfig) -> String {
        let mut message = format!(
            "New [{kind}]({REDDIT_BASE}{permalink}) by [u/{author}]({author_url})!",
            kind = item.kind.noun(),
            permalink = item.permalink,
            author = item.author_name,
            author_url = item.author_url,
        );
        if let Some(role_id) = &config.ping_role_id {
            message.push_str(&format!("\n<@&{role_id}>"));
        }
        message
    }

    /// Render and deliver an item in one step (immediate-delivery path).
    pub async fn deliver_item(&self, item: &ContentItem, config: &RelayConfig) -> Result<()> {
        let content = Self::render(item, config);
        self.deliver_content(&item.id, &content, config.webhook_url.expose_secret())
            .await
    }

    /// Deliver pre-rendered content (deferred and retry paths).
    ///
    /// Marks `relayed=true` on success; a failed attempt leaves state as-is.
    pub async fn deliver_content(
        &self,
        item_id: &str,
        content: &str,
        webhook_url: &str,
    ) -> Result<()> {
        let payload = WebhookPayload::new(content.to_string());
        let receipt = match self.transport.post(webhook_url, &payload).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(item_id = %item_id, error = %e, "Webhook delivery failed");
                return Err(e.into());
            }
        };
        debug!(
            item_id = %item_id,
            status = receipt.status,
            body = %receipt.body,
            "Webhook response"
        );

        self.store
            .merge_flags(item_id, &[(StateField::Relayed, true)])
            .await?;
        info!(item_id = %item_id, "Item relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::SecretString;
    use tokio::sync::Mutex;

    use super::*;
    use crate::config::ContentTypeFilter;
    use crate::error::DeliveryError;
    use crate::relay::types::{ItemKind, RemovalFlags};
    use crate::store::MemoryStateStore;
    use crate::webhook::DeliveryReceipt;

    #[derive(Default)]
    struct RecordingTransport {
        posts: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl DeliveryTransport for RecordingTransport {
        async fn post(
            &self,
            url: &str,
            payload: &WebhookPayload,
        ) -> std::result::Result<DeliveryReceipt, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Rejected {
                    status: 429,
                    body: "rate limited".into(),
                });
            }
            self.posts
                .lock()
                .await
                .push((url.to_string(), payload.content.clone()));
            Ok(DeliveryReceipt {
                status: 204,
                body: String::new(),
            })
        }
    }

    fn make_post() -> ContentItem {
        ContentItem {
            id: "t3_abc".into(),
            kind: ItemKind::Post,
            parent_id: None,
            author_name: "alice".into(),
            author_url: "https://www.reddit.com/user/alice".into(),
            permalink: "/r/example/comments/abc/post".into(),
            created_at: Utc::now(),
            removal: RemovalFlags::default(),
            user_flair_text: None,
            user_flair_template_id: None,
            post_flair_text: None,
            post_flair_template_id: None,
        }
    }

    fn make_config(ping_role_id: Option<&str>) -> RelayConfig {
        RelayConfig {
            webhook_url: SecretString::from("https://discord.com/api/webhooks/1/abc".to_string()),
            content_type: ContentTypeFilter::All,
            include_users: None,
            exclude_users: None,
            include_user_flairs: vec![],
            exclude_user_flairs: vec![],
            include_post_flairs: vec![],
            exclude_post_flairs: vec![],
            post_delay_minutes: 0,
            comment_delay_minutes: 0,
            ignore_removed: false,
            retry_on_approval: false,
            ping_role_id: ping_role_id.map(String::from),
        }
    }

    #[test]
    fn renders_markdown_message() {
        let message = RelayDispatcher::render(&make_post(), &make_config(None));
        assert_eq!(
            message,
            "New [post](https://www.reddit.com/r/example/comments/abc/post) \
             by [u/alice](https://www.reddit.com/user/alice)!"
        );
    }

    #[test]
    fn render_appends_role_ping() {
        let message = RelayDispatcher::render(&make_post(), &make_config(Some("424242")));
        assert!(message.ends_with("!\n<@&424242>"));
    }

    #[tokio::test]
    async fn successful_delivery_marks_relayed() {
        let transport = Arc::new(RecordingTransport::default());
        let store = Arc::new(MemoryStateStore::new());
        let dispatcher = RelayDispatcher::new(transport.clone(), store.clone());

        dispatcher
            .deliver_item(&make_post(), &make_config(None))
            .await
            .unwrap();

        let posts = transport.posts.lock().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "https://discord.com/api/webhooks/1/abc");
        assert_eq!(
            store.get_flag("t3_abc", StateField::Relayed).await.unwrap(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn failed_delivery_leaves_relayed_unset() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let store = Arc::new(MemoryStateStore::new());
        let dispatcher = RelayDispatcher::new(transport, store.clone());

        let result = dispatcher.deliver_item(&make_post(), &make_config(None)).await;
        assert!(result.is_err());
        assert_eq!(
            store.get_flag("t3_abc", StateField::Relayed).await.unwrap(),
            None
        );
    }
}
