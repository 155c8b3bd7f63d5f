//! Discord relay for subreddit content-creation events.

pub mod config;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod lookup;
pub mod reddit;
pub mod relay;
pub mod store;
pub mod webhook;
