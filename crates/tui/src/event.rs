//! Event handling for the TUI
//!
//! Merges keyboard input with records and failures coming from the
//! capture tasks, so the main loop sees a single stream of events and
//! all state changes happen on the UI thread.

use anyhow::Result;
use capture::{CaptureEvent, EventReceiver};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};

/// Event types the app can receive
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input (press only)
    Key(KeyEvent),
    /// Something from a capture task
    Capture(CaptureEvent),
    /// Periodic tick for redraws (relative ages move on)
    Tick,
}

/// Produces the next event for the main loop
pub struct EventSource {
    captures: EventReceiver,
    tick_rate: Duration,
    last_tick: Instant,
}

impl EventSource {
    pub fn new(captures: EventReceiver, tick_rate: Duration) -> Self {
        Self {
            captures,
            tick_rate,
            last_tick: Instant::now(),
        }
    }

    /// Waits at most one tick. Pending capture events win over input so a
    /// burst of deliveries is applied before the next redraw.
    pub fn next(&mut self) -> Result<AppEvent> {
        if let Ok(capture) = self.captures.try_recv() {
            return Ok(AppEvent::Capture(capture));
        }

        let timeout = self.tick_rate.saturating_sub(self.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    return Ok(AppEvent::Key(key));
                }
            }
        }

        if self.last_tick.elapsed() >= self.tick_rate {
            self.last_tick = Instant::now();
        }
        Ok(AppEvent::Tick)
    }
}
