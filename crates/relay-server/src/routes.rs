use axum::{
    body::{Body, Bytes},
    extract::{Json, Query, State},
    http::{
        HeaderMap, Method, StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use common::model::{CapturedRequest, header_map};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::AppState;

/// Simple health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "hookwatch-relay",
            "version": env!("CARGO_PKG_VERSION"),
            "subscribers": state.subscriber_count()
        })),
    )
}

/// Captures any request under `/hooks` and relays it to subscribers
pub async fn ingest(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query_params): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> impl IntoResponse {
    let request = CapturedRequest::new(method.as_str(), uri.path())
        .with_headers(header_map(&headers))
        .with_query_params(query_params)
        .with_body(body_value(&body));

    let id = request.id.clone();
    info!("Received {} ({} bytes)", request.label(), body.len());
    let delivered = state.publish(request);

    Json(json!({ "id": id, "subscribers": delivered }))
}

/// Newline-delimited JSON stream of deliveries received from now on
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let mut rx = state.subscribe();
    let shutdown = state.shutdown_token();
    info!("Event subscriber connected ({} total)", state.subscriber_count());

    let stream = async_stream::stream! {
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = rx.recv() => next,
            };

            match next {
                Ok(request) => match serde_json::to_string(&request) {
                    Ok(line) => {
                        yield Ok::<_, Infallible>(format!("{}\n", line));
                    }
                    Err(e) => warn!("Failed to encode delivery {}: {}", request.id, e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} deliveries", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    (
        [
            (CONTENT_TYPE, "application/x-ndjson"),
            (CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
}

/// JSON bodies are kept structured, anything else becomes a JSON string
fn body_value(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
