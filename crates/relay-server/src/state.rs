use common::model::CapturedRequest;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Deliveries buffered per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 256;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Fan-out of captured deliveries to event-stream subscribers
    events: broadcast::Sender<CapturedRequest>,
    /// Fired on shutdown so open event streams end
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            shutdown: CancellationToken::new(),
        }
    }

    /// Sends a delivery to every current subscriber.
    /// Returns how many subscribers received it.
    pub fn publish(&self, request: CapturedRequest) -> usize {
        match self.events.send(request) {
            Ok(count) => count,
            Err(_) => {
                debug!("No subscribers, delivery dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CapturedRequest> {
        self.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
