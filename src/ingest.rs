//! Inbound-event HTTP surface.
//!
//! The trigger source POSTs the tagged event union to `/events`. Accepted
//! events are processed in a spawned task and always answered 202: failures
//! during processing are observable via logs only, never as a retry signal.
//! Payloads that don't deserialize into [`InboundEvent`] get a 422.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use crate::relay::router::EventRouter;
use crate::relay::types::InboundEvent;

#[derive(Clone)]
struct AppState {
    router: Arc<EventRouter>,
}

/// Build the ingest routes.
pub fn event_routes(router: Arc<EventRouter>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", post(accept_event))
        .with_state(AppState { router })
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn accept_event(
    State(state): State<AppState>,
    body: Result<Json<InboundEvent>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(event) = match body {
        Ok(json) => json,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed event payload");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": rejection.body_text() })),
            );
        }
    };

    let router = state.router.clone();
    tokio::spawn(async move {
        router.handle_event(event).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    )
}
