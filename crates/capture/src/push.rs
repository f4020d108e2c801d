//! Push subscription to a newline-delimited JSON event stream
//!
//! Each line is one event. A leading `data: ` (server-sent events framing)
//! is tolerated, other SSE field lines are skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::config::CaptureMode;
use common::model::{CapturedRequest, stringify_values};
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::fetch::parse_url;
use crate::source::{CaptureSource, RecordSink};

/// An inbound event; every field is optional and defaulted on receipt
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InboundEvent {
    pub id: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub headers: Option<BTreeMap<String, Value>>,
    pub body: Value,
    pub query_params: Option<BTreeMap<String, Value>>,
}

impl InboundEvent {
    pub fn into_request(self) -> CapturedRequest {
        let mut request = CapturedRequest::new(
            self.method.as_deref().unwrap_or("POST"),
            self.path.unwrap_or_else(|| "/".to_string()),
        )
        .with_headers(stringify_values(self.headers.unwrap_or_default()))
        .with_body(self.body)
        .with_query_params(stringify_values(self.query_params.unwrap_or_default()));

        if let Some(id) = self.id.filter(|id| !id.is_empty()) {
            request = request.with_id(id);
        }
        if let Some(timestamp) = self.timestamp {
            request = request.with_timestamp(timestamp);
        }
        request
    }
}

/// Parses one stream line. `None` for blank and non-data lines.
pub fn parse_event_line(line: &str) -> Option<Result<CapturedRequest, serde_json::Error>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let payload = match trimmed.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None if is_sse_field(trimmed) => return None,
        None => trimmed,
    };

    Some(serde_json::from_str::<InboundEvent>(payload).map(InboundEvent::into_request))
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
}

/// The events endpoint on the same origin as `base`
pub fn events_url(base: &str, events_path: &str) -> Result<Url, CaptureError> {
    let base = parse_url(base)?;
    base.join(events_path).map_err(|e| CaptureError::InvalidUrl {
        url: format!("{}{}", base, events_path),
        reason: e.to_string(),
    })
}

/// Records decoded from an event stream
pub type EventStream = Pin<Box<dyn Stream<Item = Result<CapturedRequest, CaptureError>> + Send>>;

pub struct PushSource {
    client: Client,
    events_path: String,
}

impl PushSource {
    pub fn new(client: Client, events_path: impl Into<String>) -> Self {
        Self {
            client,
            events_path: events_path.into(),
        }
    }

    /// Opens the event stream. The stream ends with
    /// [`CaptureError::StreamClosed`] when the server hangs up.
    pub async fn subscribe(&self, base: &str) -> Result<EventStream, CaptureError> {
        let url = events_url(base, &self.events_path)?;
        debug!("Subscribing to {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/x-ndjson, text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptureError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let url = url.to_string();
        let byte_stream = response.bytes_stream();

        Ok(Box::pin(async_stream::try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = Box::pin(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let bytes = chunk.map_err(CaptureError::from)?;
                buffer.extend_from_slice(&bytes);

                while let Some(newline_idx) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline_idx).collect();
                    let line = String::from_utf8_lossy(&line);
                    match parse_event_line(&line) {
                        Some(Ok(request)) => {
                            yield request;
                        }
                        Some(Err(e)) => warn!("Dropping unparseable event: {} | Line: {}", e, line.trim()),
                        None => {}
                    }
                }
            }

            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                match parse_event_line(&line) {
                    Some(Ok(request)) => {
                        yield request;
                    }
                    Some(Err(e)) => warn!("Dropping unparseable event: {} | Line: {}", e, line.trim()),
                    None => {}
                }
            }

            Err::<(), _>(CaptureError::StreamClosed { url: url.clone() })?;
        }))
    }
}

#[async_trait]
impl CaptureSource for PushSource {
    fn mode(&self) -> CaptureMode {
        CaptureMode::Push
    }

    async fn run(
        &self,
        url: &str,
        sink: RecordSink,
        cancel: CancellationToken,
    ) -> Result<(), CaptureError> {
        let mut stream = self.subscribe(url).await?;
        info!("Subscribed to push events for {}", url);

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                item = stream.next() => item,
            };

            match item {
                Some(Ok(request)) => {
                    info!("Received {}", request.label());
                    if !sink.record(request) {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(CaptureError::StreamClosed {
                        url: url.to_string(),
                    });
                }
            }
        }
    }
}
