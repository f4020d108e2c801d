//! On-demand capture: one GET, mapped into a record

use async_trait::async_trait;
use common::config::CaptureMode;
use common::model::{CapturedRequest, header_map};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::source::{CaptureSource, RecordSink};

/// Validates a user-supplied URL. Only http and https are accepted.
pub fn parse_url(url: &str) -> Result<Url, CaptureError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::EmptyUrl);
    }

    let parsed = Url::parse(trimmed).map_err(|e| CaptureError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CaptureError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Fetches `url` once and maps the response into a GET record
pub async fn fetch_request(client: &Client, url: &str) -> Result<CapturedRequest, CaptureError> {
    let target = parse_url(url)?;
    debug!("Fetching {}", target);

    let response = client.get(target.clone()).send().await?;
    let (headers, body) = read_json_response(response, target.as_str()).await?;

    Ok(CapturedRequest::new("GET", url.trim())
        .with_headers(headers)
        .with_body(body)
        .with_query_params(query_params(&target)))
}

/// Checks the status and decodes the body as JSON
pub(crate) async fn read_json_response(
    response: Response,
    url: &str,
) -> Result<(BTreeMap<String, String>, Value), CaptureError> {
    let status = response.status();
    if !status.is_success() {
        return Err(CaptureError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let headers = header_map(response.headers());
    let text = response.text().await?;
    let body = serde_json::from_str(&text).map_err(|source| CaptureError::MalformedBody {
        url: url.to_string(),
        source,
    })?;

    Ok((headers, body))
}

/// Query pairs of a URL; a repeated key keeps its last value
pub fn query_params(url: &Url) -> BTreeMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Captures once on start, then stays active without a timer
pub struct FetchSource {
    client: Client,
}

impl FetchSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CaptureSource for FetchSource {
    fn mode(&self) -> CaptureMode {
        CaptureMode::Fetch
    }

    async fn run(
        &self,
        url: &str,
        sink: RecordSink,
        cancel: CancellationToken,
    ) -> Result<(), CaptureError> {
        let request = fetch_request(&self.client, url).await?;
        info!("Captured {}", request.label());
        sink.record(request);

        cancel.cancelled().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_rejects_empty_and_relative() {
        assert!(matches!(parse_url("   "), Err(CaptureError::EmptyUrl)));
        assert!(matches!(parse_url("/webhook"), Err(CaptureError::InvalidUrl { .. })));
        assert!(matches!(
            parse_url("ftp://example.com/file"),
            Err(CaptureError::InvalidUrl { .. })
        ));
        assert_eq!(
            parse_url(" https://example.com/hook ").unwrap().as_str(),
            "https://example.com/hook"
        );
    }

    #[test]
    fn test_query_params_decodes_pairs() {
        let url = Url::parse("https://example.com/hook?event=push&repo=a%2Fb&event=ping").unwrap();
        let params = query_params(&url);
        assert_eq!(params.len(), 2);
        assert_eq!(params["repo"], "a/b");
        assert_eq!(params["event"], "ping");
    }
}
