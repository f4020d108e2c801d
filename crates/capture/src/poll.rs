//! Fixed-interval polling, optionally through a CORS relay

use async_trait::async_trait;
use common::config::CaptureMode;
use common::model::CapturedRequest;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::fetch::{fetch_request, parse_url, query_params, read_json_response};
use crate::source::{CaptureSource, RecordSink};

/// Builds the relay request URL for `target`.
///
/// `{url}` in the template is replaced with the percent-encoded target;
/// without a placeholder the encoded target is appended.
pub fn relay_url(template: &str, target: &str) -> String {
    let encoded = urlencoding::encode(target);
    if template.contains("{url}") {
        template.replace("{url}", &encoded)
    } else {
        format!("{}{}", template, encoded)
    }
}

/// Relays answer either `{"contents": "<json text>"}` or the raw body
pub fn unwrap_relay_body(body: Value, relay: &str) -> Result<Value, CaptureError> {
    match body.get("contents").and_then(Value::as_str) {
        Some(contents) => {
            serde_json::from_str(contents).map_err(|source| CaptureError::MalformedBody {
                url: relay.to_string(),
                source,
            })
        }
        None => Ok(body),
    }
}

pub struct PollSource {
    client: Client,
    interval: Duration,
    relay: Option<String>,
}

impl PollSource {
    pub fn new(client: Client, interval: Duration) -> Self {
        Self {
            client,
            interval,
            relay: None,
        }
    }

    pub fn with_relay(mut self, relay: Option<String>) -> Self {
        self.relay = relay.filter(|r| !r.trim().is_empty());
        self
    }

    /// One capture attempt, direct or relayed
    pub async fn poll_once(&self, url: &str) -> Result<CapturedRequest, CaptureError> {
        let Some(template) = &self.relay else {
            return fetch_request(&self.client, url).await;
        };

        let target = parse_url(url)?;
        let relay = parse_url(&relay_url(template, target.as_str()))?;
        debug!("Polling {} via {}", target, relay);

        let response = self.client.get(relay.clone()).send().await?;
        let (headers, body) = read_json_response(response, relay.as_str()).await?;
        let body = unwrap_relay_body(body, relay.as_str())?;

        Ok(CapturedRequest::new("GET", url.trim())
            .with_headers(headers)
            .with_body(body)
            .with_query_params(query_params(&target)))
    }
}

#[async_trait]
impl CaptureSource for PollSource {
    fn mode(&self) -> CaptureMode {
        CaptureMode::Poll
    }

    async fn run(
        &self,
        url: &str,
        sink: RecordSink,
        cancel: CancellationToken,
    ) -> Result<(), CaptureError> {
        // First tick completes immediately, which doubles as the initial capture
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_body: Option<Value> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let request = self.poll_once(url).await?;
            if last_body.as_ref() == Some(&request.body) {
                debug!("Body unchanged since last poll of {}", url);
                continue;
            }

            info!("Captured {}", request.label());
            last_body = Some(request.body.clone());
            if !sink.record(request) {
                return Ok(());
            }
        }
    }
}
