use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Request, StatusCode};
use common::config::ServerConfig;
use common::model::CapturedRequest;
use futures::{Stream, StreamExt};
use relay_server::{AppState, create_router, start_server};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

fn local_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_router(AppState::new());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "hookwatch-relay");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_ingest_publishes_capture() {
    let state = AppState::new();
    let mut rx = state.subscribe();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/hooks/github?delivery=42&retry=false")
                .header("content-type", "application/json")
                .header("x-github-event", "push")
                .body(Body::from(r#"{"ref":"refs/heads/main"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subscribers"], 1);

    let captured = rx.try_recv().unwrap();
    assert_eq!(body["id"], captured.id.as_str());
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/hooks/github");
    assert_eq!(captured.query_params["delivery"], "42");
    assert_eq!(captured.query_params["retry"], "false");
    assert_eq!(captured.headers["x-github-event"], "push");
    assert_eq!(captured.body, json!({"ref": "refs/heads/main"}));
}

#[tokio::test]
async fn test_ingest_accepts_any_method_and_plain_body() {
    let state = AppState::new();
    let mut rx = state.subscribe();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/hooks")
                .body(Body::from("plain text"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let captured = rx.try_recv().unwrap();
    assert_eq!(captured.method, "PUT");
    assert_eq!(captured.path, "/hooks");
    assert_eq!(captured.body, json!("plain text"));
    assert!(captured.query_params.is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_router(AppState::new());
    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_delivers_and_closes_on_shutdown() {
    let server = start_server(local_config()).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/webhooks/events", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/x-ndjson"
    );
    let mut stream = Box::pin(response.bytes_stream());
    let mut buffer = Vec::new();

    client
        .post(format!("{}/hooks/stripe?livemode=false", server.url()))
        .json(&json!({"type": "invoice.paid"}))
        .send()
        .await
        .unwrap();

    let line = tokio::time::timeout(Duration::from_secs(5), next_line(&mut stream, &mut buffer))
        .await
        .unwrap()
        .unwrap();
    let captured: CapturedRequest = serde_json::from_str(&line).unwrap();
    assert_eq!(captured.path, "/hooks/stripe");
    assert_eq!(captured.query_params["livemode"], "false");
    assert_eq!(captured.body, json!({"type": "invoice.paid"}));

    server.shutdown();
    let rest = tokio::time::timeout(Duration::from_secs(5), next_line(&mut stream, &mut buffer))
        .await
        .unwrap();
    assert!(rest.is_none());
}

#[tokio::test]
async fn test_shutdown_and_wait_releases_the_port() {
    let server = start_server(local_config()).await.unwrap();
    let health_url = format!("{}/health", server.url());
    let client = reqwest::Client::new();
    assert!(client.get(&health_url).send().await.unwrap().status().is_success());

    tokio::time::timeout(Duration::from_secs(5), server.shutdown_and_wait())
        .await
        .unwrap();
    assert!(client.get(&health_url).send().await.is_err());
}

/// Reads the next newline-terminated line, buffering partial chunks
async fn next_line<S>(stream: &mut S, buffer: &mut Vec<u8>) -> Option<String>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    loop {
        if let Some(idx) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=idx).collect();
            return Some(String::from_utf8_lossy(&line).trim().to_string());
        }
        match stream.next().await {
            Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
            _ => return None,
        }
    }
}
