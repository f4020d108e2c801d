//! The Idle/Listening state machine and the session that owns it
//!
//! ```text
//! Idle --start(url)--> Listening      initial capture attempt
//! Listening --stop--> Idle            task cancelled
//! Listening --transport error--> Idle
//! Idle --start("")--> Idle            rejected, EmptyUrl
//! ```
//!
//! Each listening run gets a new generation number. Events from a run
//! that is no longer current are discarded in [`Listener::accept`], so
//! nothing from a stopped run ever reaches the store.

use common::config::{CaptureConfig, CaptureMode};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::fetch::{fetch_request, parse_url};
use crate::source::{
    CaptureEvent, CaptureSource, EventSender, Origin, RecordSink, http_client, source_for,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Idle,
    Listening,
}

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

struct ActiveRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveRun {
    fn shutdown(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Runs one capture source at a time
pub struct Listener {
    source: Arc<dyn CaptureSource>,
    client: Client,
    tx: EventSender,
    state: ListenState,
    generation: u64,
    active: Option<ActiveRun>,
}

impl Listener {
    pub fn new(source: Arc<dyn CaptureSource>, client: Client, tx: EventSender) -> Self {
        Self {
            source,
            client,
            tx,
            state: ListenState::Idle,
            generation: 0,
            active: None,
        }
    }

    pub fn from_config(config: &CaptureConfig, tx: EventSender) -> Result<Self, CaptureError> {
        let client = http_client(config)?;
        let source = source_for(config, client.clone());
        Ok(Self::new(source, client, tx))
    }

    pub fn state(&self) -> ListenState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ListenState::Listening
    }

    pub fn mode(&self) -> CaptureMode {
        self.source.mode()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts listening on `url`. Starting while already listening is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, url: &str) -> Result<(), CaptureError> {
        if self.is_listening() {
            return Ok(());
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(CaptureError::EmptyUrl);
        }
        if self.mode() != CaptureMode::Fixture {
            parse_url(url)?;
        }

        self.generation += 1;
        let origin = Origin::Session(self.generation);
        let sink = RecordSink::new(self.tx.clone(), origin);
        let cancel = CancellationToken::new();

        let source = Arc::clone(&self.source);
        let task_cancel = cancel.clone();
        let url_owned = url.to_string();

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => Ok(()),
                result = source.run(&url_owned, sink.clone(), task_cancel.clone()) => result,
            };

            if let Err(e) = result {
                if !task_cancel.is_cancelled() {
                    warn!("Capture from {} failed: {}", url_owned, e);
                    sink.fail(e);
                }
            }
        });

        info!(
            "Listening on {} ({} mode, generation {})",
            url,
            self.mode(),
            self.generation
        );
        self.active = Some(ActiveRun { cancel, handle });
        self.state = ListenState::Listening;
        Ok(())
    }

    /// Stops listening and releases the running task.
    /// Returns whether anything was running.
    pub fn stop(&mut self) -> bool {
        let was_listening = self.is_listening();
        if let Some(run) = self.active.take() {
            run.shutdown();
        }
        self.state = ListenState::Idle;

        if was_listening {
            info!("Stopped listening (generation {})", self.generation);
        }
        was_listening
    }

    pub fn toggle(&mut self, url: &str) -> Result<Transition, CaptureError> {
        if self.is_listening() {
            self.stop();
            Ok(Transition::Stopped)
        } else {
            self.start(url)?;
            Ok(Transition::Started)
        }
    }

    /// One-off GET of `url`, independent of the listening state.
    /// The result arrives as an [`Origin::OnDemand`] event.
    pub fn fetch_once(&self, url: &str) -> Result<(), CaptureError> {
        parse_url(url)?;

        let client = self.client.clone();
        let sink = RecordSink::new(self.tx.clone(), Origin::OnDemand);
        let url = url.trim().to_string();

        tokio::spawn(async move {
            match fetch_request(&client, &url).await {
                Ok(request) => {
                    info!("Captured {}", request.label());
                    sink.record(request);
                }
                Err(e) => {
                    warn!("Fetch of {} failed: {}", url, e);
                    sink.fail(e);
                }
            }
        });
        Ok(())
    }

    /// Filters an event from the channel against the current run.
    ///
    /// Returns the event if it should be applied. A failure from the
    /// current run moves the listener back to Idle.
    pub fn accept(&mut self, event: CaptureEvent) -> Option<CaptureEvent> {
        match event.origin() {
            Origin::OnDemand => Some(event),
            Origin::Session(generation)
                if generation == self.generation && self.is_listening() =>
            {
                if matches!(event, CaptureEvent::Failed { .. }) {
                    self.stop();
                }
                Some(event)
            }
            Origin::Session(generation) => {
                debug!(
                    "Dropping event from stale generation {} (current {})",
                    generation, self.generation
                );
                None
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.shutdown();
        }
    }
}

/// Session-scoped state: the target URL and the listener driving it
pub struct Session {
    url: String,
    listener: Listener,
}

impl Session {
    pub fn new(url: impl Into<String>, listener: Listener) -> Self {
        Self {
            url: url.into(),
            listener,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replaces the URL. A running capture keeps the URL it started with.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into().trim().to_string();
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_listening()
    }

    pub fn mode(&self) -> CaptureMode {
        self.listener.mode()
    }

    pub fn toggle(&mut self) -> Result<Transition, CaptureError> {
        self.listener.toggle(&self.url)
    }

    pub fn stop(&mut self) -> bool {
        self.listener.stop()
    }

    pub fn fetch_now(&self) -> Result<(), CaptureError> {
        self.listener.fetch_once(&self.url)
    }

    /// The URL for copying; empty is a validation error
    pub fn copyable_url(&self) -> Result<&str, CaptureError> {
        if self.url.is_empty() {
            Err(CaptureError::EmptyUrl)
        } else {
            Ok(&self.url)
        }
    }

    pub fn accept(&mut self, event: CaptureEvent) -> Option<CaptureEvent> {
        self.listener.accept(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureSource;
    use crate::source::create_channel;
    use common::model::CapturedRequest;
    use std::time::Duration;

    fn fixture_listener() -> (Listener, crate::source::EventReceiver) {
        let (tx, rx) = create_channel();
        (Listener::new(Arc::new(FixtureSource), Client::new(), tx), rx)
    }

    #[test]
    fn test_start_with_empty_url_stays_idle() {
        let (mut listener, _rx) = fixture_listener();
        let err = listener.start("   ").unwrap_err();
        assert!(matches!(err, CaptureError::EmptyUrl));
        assert_eq!(listener.state(), ListenState::Idle);
        assert_eq!(listener.generation(), 0);
    }

    #[test]
    fn test_network_mode_rejects_invalid_url() {
        let (tx, _rx) = create_channel();
        let config = CaptureConfig::default();
        let mut listener = Listener::from_config(&config, tx).unwrap();
        assert!(matches!(
            listener.start("not a url"),
            Err(CaptureError::InvalidUrl { .. })
        ));
        assert!(!listener.is_listening());
    }

    #[tokio::test]
    async fn test_toggle_cycles_states() {
        let (mut listener, mut rx) = fixture_listener();

        assert_eq!(listener.toggle("demo").unwrap(), Transition::Started);
        assert!(listener.is_listening());

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let accepted = listener.accept(event).unwrap();
        assert!(matches!(accepted, CaptureEvent::Record { .. }));

        assert_eq!(listener.toggle("demo").unwrap(), Transition::Stopped);
        assert_eq!(listener.state(), ListenState::Idle);
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let (mut listener, _rx) = fixture_listener();
        listener.start("demo").unwrap();
        listener.stop();
        listener.start("demo").unwrap();
        assert_eq!(listener.generation(), 2);

        let stale = CaptureEvent::Record {
            origin: Origin::Session(1),
            request: CapturedRequest::new("POST", "/old"),
        };
        assert!(listener.accept(stale).is_none());

        let stale_failure = CaptureEvent::Failed {
            origin: Origin::Session(1),
            error: CaptureError::StreamClosed { url: "x".into() },
        };
        assert!(listener.accept(stale_failure).is_none());
        assert!(listener.is_listening());
    }

    #[tokio::test]
    async fn test_failure_of_current_run_goes_idle() {
        let (mut listener, _rx) = fixture_listener();
        listener.start("demo").unwrap();

        let failure = CaptureEvent::Failed {
            origin: Origin::Session(listener.generation()),
            error: CaptureError::StreamClosed { url: "x".into() },
        };
        assert!(listener.accept(failure).is_some());
        assert_eq!(listener.state(), ListenState::Idle);
    }

    #[tokio::test]
    async fn test_events_after_stop_are_dropped() {
        let (mut listener, _rx) = fixture_listener();
        listener.start("demo").unwrap();
        let generation = listener.generation();
        listener.stop();

        let late = CaptureEvent::Record {
            origin: Origin::Session(generation),
            request: CapturedRequest::new("POST", "/late"),
        };
        assert!(listener.accept(late).is_none());
    }

    #[test]
    fn test_on_demand_events_always_pass() {
        let (mut listener, _rx) = fixture_listener();
        let event = CaptureEvent::Failed {
            origin: Origin::OnDemand,
            error: CaptureError::EmptyUrl,
        };
        assert!(listener.accept(event).is_some());
        assert_eq!(listener.state(), ListenState::Idle);
    }

    #[test]
    fn test_session_copyable_url() {
        let (listener, _rx) = fixture_listener();
        let mut session = Session::new("", listener);
        assert!(matches!(session.copyable_url(), Err(CaptureError::EmptyUrl)));

        session.set_url("  http://localhost:8080/hooks  ");
        assert_eq!(session.copyable_url().unwrap(), "http://localhost:8080/hooks");
    }

    #[test]
    fn test_session_toggle_with_empty_url_is_rejected() {
        let (listener, _rx) = fixture_listener();
        let mut session = Session::new("", listener);
        assert!(session.toggle().unwrap_err().is_validation());
        assert!(!session.is_listening());
    }
}
