use std::sync::Arc;

use discord_relay::config::EnvSettings;
use discord_relay::ingest::event_routes;
use discord_relay::jobs::{JobQueue, TokioJobQueue};
use discord_relay::lookup::SubredditLookup;
use discord_relay::reddit::RedditClient;
use discord_relay::relay::{DelayScheduler, EventRouter, RelayDispatcher};
use discord_relay::store::{MemoryStateStore, StateStore};
use discord_relay::webhook::{DeliveryTransport, DiscordWebhook};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let subreddit = std::env::var("RELAY_SUBREDDIT").unwrap_or_else(|_| {
        eprintln!("Error: RELAY_SUBREDDIT not set");
        eprintln!("  export RELAY_SUBREDDIT=example");
        std::process::exit(1);
    });

    let port: u16 = std::env::var("RELAY_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let settings = Arc::new(EnvSettings);
    let lookup: Arc<dyn SubredditLookup> = Arc::new(RedditClient::new(subreddit.clone()));
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let transport: Arc<dyn DeliveryTransport> = Arc::new(DiscordWebhook::new());
    let queue = Arc::new(TokioJobQueue::new());

    let dispatcher = Arc::new(RelayDispatcher::new(transport, store.clone()));
    let scheduler = Arc::new(DelayScheduler::new(
        dispatcher,
        store.clone(),
        lookup.clone(),
        queue.clone() as Arc<dyn JobQueue>,
    ));
    // Deferred jobs fire back into the scheduler.
    queue.register(scheduler.clone());

    let router = Arc::new(EventRouter::new(settings, lookup, store, scheduler));
    let app = event_routes(router);

    tracing::info!(subreddit = %subreddit, port, "discord-relay listening");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
