//! The capability every capture strategy implements, and the channel
//! captured records travel through.

use async_trait::async_trait;
use common::config::{CaptureConfig, CaptureMode};
use common::model::CapturedRequest;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::CaptureError;
use crate::fetch::FetchSource;
use crate::fixture::FixtureSource;
use crate::poll::PollSource;
use crate::push::PushSource;

/// Which run produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A one-off fetch triggered by the user
    OnDemand,
    /// A listening run, identified by its generation number
    Session(u64),
}

/// Events delivered from capture tasks to the UI loop
#[derive(Debug)]
pub enum CaptureEvent {
    Record {
        origin: Origin,
        request: CapturedRequest,
    },
    Failed {
        origin: Origin,
        error: CaptureError,
    },
}

impl CaptureEvent {
    pub fn origin(&self) -> Origin {
        match self {
            CaptureEvent::Record { origin, .. } | CaptureEvent::Failed { origin, .. } => *origin,
        }
    }
}

/// Event sender for capture tasks
pub type EventSender = mpsc::UnboundedSender<CaptureEvent>;
/// Event receiver drained by the UI loop
pub type EventReceiver = mpsc::UnboundedReceiver<CaptureEvent>;

/// Create an event channel
pub fn create_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// The single append callback a source reports through
#[derive(Debug, Clone)]
pub struct RecordSink {
    tx: EventSender,
    origin: Origin,
}

impl RecordSink {
    pub fn new(tx: EventSender, origin: Origin) -> Self {
        Self { tx, origin }
    }

    /// Hands a record to the store. Returns false once nobody is listening.
    pub fn record(&self, request: CapturedRequest) -> bool {
        self.tx
            .send(CaptureEvent::Record {
                origin: self.origin,
                request,
            })
            .is_ok()
    }

    pub fn fail(&self, error: CaptureError) -> bool {
        self.tx
            .send(CaptureEvent::Failed {
                origin: self.origin,
                error,
            })
            .is_ok()
    }
}

/// A strategy that produces captured requests from an external origin
#[async_trait]
pub trait CaptureSource: Send + Sync {
    fn mode(&self) -> CaptureMode;

    /// Captures from `url` into `sink` until `cancel` fires.
    ///
    /// An `Err` ends the run and is reported as a transport failure.
    async fn run(
        &self,
        url: &str,
        sink: RecordSink,
        cancel: CancellationToken,
    ) -> Result<(), CaptureError>;
}

/// Builds the HTTP client shared by the network sources
pub fn http_client(config: &CaptureConfig) -> Result<Client, CaptureError> {
    let mut builder = ClientBuilder::new().user_agent(concat!("hookwatch/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Picks the source for the configured mode
pub fn source_for(config: &CaptureConfig, client: Client) -> Arc<dyn CaptureSource> {
    match config.mode {
        CaptureMode::Fetch => Arc::new(FetchSource::new(client)),
        CaptureMode::Poll => Arc::new(
            PollSource::new(client, config.poll_interval()).with_relay(config.relay_url.clone()),
        ),
        CaptureMode::Push => Arc::new(PushSource::new(client, config.events_path.clone())),
        CaptureMode::Fixture => Arc::new(FixtureSource),
    }
}
