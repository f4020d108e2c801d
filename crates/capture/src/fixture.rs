//! Built-in sample webhook for fixture mode

use async_trait::async_trait;
use common::config::CaptureMode;
use common::model::CapturedRequest;
use serde_json::json;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::error::CaptureError;
use crate::source::{CaptureSource, RecordSink};

/// A hard-coded webhook delivery used to demo the UI without a backend.
/// Every call yields a fresh id and timestamp.
pub fn sample_request() -> CapturedRequest {
    let headers: BTreeMap<String, String> = [
        ("content-type", "application/json"),
        ("user-agent", "GitHub-Hookshot/7a1e5c2"),
        ("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958"),
        ("x-github-event", "push"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let query_params = BTreeMap::from([("source".to_string(), "github".to_string())]);

    CapturedRequest::new("POST", "/webhook")
        .with_headers(headers)
        .with_query_params(query_params)
        .with_body(json!({
            "ref": "refs/heads/main",
            "repository": {
                "id": 1296269,
                "full_name": "octocat/Hello-World",
                "private": false
            },
            "pusher": {
                "name": "octocat",
                "email": "octocat@github.com"
            },
            "commits": [
                {
                    "id": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
                    "message": "Fix all the bugs",
                    "distinct": true
                }
            ]
        }))
}

/// Emits the sample once, then stays active
pub struct FixtureSource;

#[async_trait]
impl CaptureSource for FixtureSource {
    fn mode(&self) -> CaptureMode {
        CaptureMode::Fixture
    }

    async fn run(
        &self,
        _url: &str,
        sink: RecordSink,
        cancel: CancellationToken,
    ) -> Result<(), CaptureError> {
        sink.record(sample_request());
        cancel.cancelled().await;
        Ok(())
    }
}
