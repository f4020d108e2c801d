//! Application state and update logic

use anyhow::Result;
use capture::fixture::sample_request;
use capture::source::create_channel;
use capture::{
    CaptureError, CaptureEvent, EventReceiver, Listener, Origin, RequestStore, Session, Transition,
};
use common::clipboard;
use common::config::{CaptureMode, Config};
use crossterm::event::KeyCode;
use ratatui::{Terminal, backend::Backend};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::event::{AppEvent, EventSource};
use crate::ui;

/// Oldest notifications are dropped past this many
const MAX_NOTIFICATIONS: usize = 500;

/// Notification shown in the activity panel
#[derive(Debug, Clone)]
pub struct Notification {
    pub timestamp: String,
    pub title: String,
    pub description: String,
    pub level: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Active input mode
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    UrlInput(String),
    Help,
}

/// Tabs of the detail pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Body,
    Headers,
    Query,
}

impl DetailTab {
    pub fn all() -> [DetailTab; 3] {
        [DetailTab::Body, DetailTab::Headers, DetailTab::Query]
    }

    pub fn title(&self) -> &'static str {
        match self {
            DetailTab::Body => "Body",
            DetailTab::Headers => "Headers",
            DetailTab::Query => "Query Params",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DetailTab::Body => 0,
            DetailTab::Headers => 1,
            DetailTab::Query => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::all()[(self.index() + 1) % 3]
    }

    pub fn previous(&self) -> Self {
        Self::all()[(self.index() + 2) % 3]
    }
}

/// Main application state
pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Target URL and listening state
    pub session: Session,
    /// Captured requests and selection
    pub store: RequestStore,
    /// Active detail tab
    pub tab: DetailTab,
    /// Current input mode
    pub input_mode: InputMode,
    /// Notification history, oldest first
    pub notifications: Vec<Notification>,
    /// Notification scroll position
    pub notification_scroll: usize,
    /// Vertical scroll of the detail content
    pub detail_scroll: u16,
    /// Where exports are written
    pub export_dir: PathBuf,
}

impl App {
    /// Create a new App and the receiver its capture tasks report to
    pub fn new(config: &Config) -> Result<(Self, EventReceiver)> {
        let (tx, rx) = create_channel();
        let listener = Listener::from_config(&config.capture, tx)?;
        let mode = listener.mode();

        let mut app = Self {
            running: true,
            session: Session::new(config.capture.url.clone(), listener),
            store: RequestStore::new(),
            tab: DetailTab::default(),
            input_mode: InputMode::Normal,
            notifications: Vec::new(),
            notification_scroll: 0,
            detail_scroll: 0,
            export_dir: config.export.directory(),
        };

        if mode == CaptureMode::Fixture {
            app.store.append(sample_request());
        }

        app.notify(
            Severity::Info,
            "hookwatch started",
            format!("{} mode. Press [E] to set the URL, [S] to start, [H] for help", mode),
        );

        Ok((app, rx))
    }

    /// Get current timestamp
    fn now() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    pub fn notify(&mut self, level: Severity, title: impl Into<String>, description: impl Into<String>) {
        let notification = Notification {
            timestamp: Self::now(),
            title: title.into(),
            description: description.into(),
            level,
        };
        debug!("{:?}: {} - {}", level, notification.title, notification.description);
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
        // Auto-scroll to bottom (keep last 5 visible)
        if self.notifications.len() > 5 {
            self.notification_scroll = self.notifications.len().saturating_sub(5);
        }
    }

    /// The most recent notification
    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    /// Run the main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>, events: &mut EventSource) -> Result<()>
    where
        B::Error: Send + Sync + 'static,
    {
        while self.running {
            terminal.draw(|frame| ui::render(frame, self))?;

            match events.next()? {
                AppEvent::Key(key) => self.handle_key(key.code),
                AppEvent::Capture(event) => self.handle_capture(event),
                AppEvent::Tick => {}
            }
        }

        self.session.stop();
        Ok(())
    }

    /// Applies an event from a capture task
    pub fn handle_capture(&mut self, event: CaptureEvent) {
        let Some(event) = self.session.accept(event) else {
            return;
        };

        match event {
            CaptureEvent::Record { origin, request } => {
                let id = request.id.clone();
                let label = request.label();
                if !self.store.append(request) {
                    return;
                }
                self.store.select(&id);
                self.detail_scroll = 0;

                match origin {
                    Origin::OnDemand => self.notify(
                        Severity::Success,
                        "Request Successful",
                        "New webhook request has been received and logged.",
                    ),
                    Origin::Session(_) => self.notify(Severity::Info, "Request received", label),
                }
            }
            CaptureEvent::Failed {
                origin: Origin::OnDemand,
                error,
            } => self.notify(Severity::Error, "Request Failed", error.to_string()),
            CaptureEvent::Failed {
                origin: Origin::Session(_),
                error,
            } => self.notify(
                Severity::Error,
                "Connection Failed",
                format!("Stopped listening: {}", error),
            ),
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyCode) {
        match self.input_mode.clone() {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::UrlInput(current) => self.handle_url_input(key, current),
            InputMode::Help => {
                // Any key exits help
                self.input_mode = InputMode::Normal;
            }
        }
    }

    /// Handle keys in normal mode
    fn handle_normal_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("Shutting down");
                self.session.stop();
                self.running = false;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => self.toggle_listening(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.input_mode = InputMode::UrlInput(self.session.url().to_string());
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.fetch_now(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.copy_url(),
            KeyCode::Char('y') | KeyCode::Char('Y') => self.copy_selected(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.clear_requests(),
            KeyCode::Char('d') | KeyCode::Char('D') => self.download_requests(),
            KeyCode::Tab | KeyCode::Right => self.set_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.set_tab(self.tab.previous()),
            KeyCode::Char('1') => self.set_tab(DetailTab::Body),
            KeyCode::Char('2') => self.set_tab(DetailTab::Headers),
            KeyCode::Char('3') => self.set_tab(DetailTab::Query),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Home | KeyCode::Char('g') => self.select_index(0),
            KeyCode::End | KeyCode::Char('G') => {
                self.select_index(self.store.len().saturating_sub(1))
            }
            KeyCode::PageDown => self.detail_scroll = self.detail_scroll.saturating_add(10),
            KeyCode::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(10),
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                self.input_mode = InputMode::Help;
            }
            _ => {}
        }
    }

    /// Handle keys while editing the URL
    fn handle_url_input(&mut self, key: KeyCode, current: String) {
        match key {
            KeyCode::Enter => {
                self.session.set_url(current);
                self.input_mode = InputMode::Normal;
                if !self.session.url().is_empty() {
                    self.fetch_now();
                }
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                let mut new = current;
                new.pop();
                self.input_mode = InputMode::UrlInput(new);
            }
            KeyCode::Char(c) => {
                let mut new = current;
                new.push(c);
                self.input_mode = InputMode::UrlInput(new);
            }
            _ => {}
        }
    }

    /// Start or stop listening
    pub fn toggle_listening(&mut self) {
        match self.session.toggle() {
            Ok(Transition::Started) => {
                let description = format!("Listening on {} ({} mode)", self.session.url(), self.session.mode());
                self.notify(Severity::Success, "Started Listening", description);
            }
            Ok(Transition::Stopped) => self.notify(
                Severity::Info,
                "Stopped Listening",
                "Webhook listener has been stopped.",
            ),
            Err(CaptureError::EmptyUrl) => self.notify(
                Severity::Error,
                "URL Required",
                "Please enter a webhook URL before starting to listen.",
            ),
            Err(e) if e.is_validation() => self.notify(Severity::Error, "Invalid URL", e.to_string()),
            Err(e) => self.notify(Severity::Error, "Connection Failed", e.to_string()),
        }
    }

    /// One-off capture of the current URL
    pub fn fetch_now(&mut self) {
        match self.session.fetch_now() {
            Ok(()) => self.notify(Severity::Info, "Fetching", self.session.url().to_string()),
            Err(CaptureError::EmptyUrl) => self.notify(
                Severity::Error,
                "URL Required",
                "Please enter a webhook URL first.",
            ),
            Err(e) => self.notify(Severity::Error, "Request Failed", e.to_string()),
        }
    }

    fn copy_url(&mut self) {
        let url = match self.session.copyable_url() {
            Ok(url) => url.to_string(),
            Err(_) => {
                self.notify(Severity::Error, "No URL to copy", "Please enter a webhook URL first.");
                return;
            }
        };

        match clipboard::copy(&url) {
            Ok(_) => self.notify(
                Severity::Success,
                "URL copied to clipboard",
                "Your webhook URL has been copied to the clipboard.",
            ),
            Err(e) => self.notify(Severity::Error, "Copy failed", e.to_string()),
        }
    }

    fn copy_selected(&mut self) {
        let Some(request) = self.store.selected() else {
            self.notify(Severity::Warning, "Nothing selected", "Select a request to copy it.");
            return;
        };

        let copied = request
            .to_pretty_json()
            .map_err(|e| e.to_string())
            .and_then(|json| clipboard::copy(&json).map_err(|e| e.to_string()));

        match copied {
            Ok(_) => self.notify(
                Severity::Success,
                "Copied to clipboard",
                "The request data has been copied to your clipboard.",
            ),
            Err(e) => self.notify(Severity::Error, "Copy failed", e),
        }
    }

    pub fn clear_requests(&mut self) {
        self.store.clear();
        self.detail_scroll = 0;
        self.notify(
            Severity::Success,
            "Requests cleared",
            "All webhook requests have been cleared.",
        );
    }

    pub fn download_requests(&mut self) {
        match self.store.export_to(&self.export_dir) {
            Ok(path) => self.notify(
                Severity::Success,
                "Requests downloaded",
                format!("Saved {} request(s) to {}", self.store.len(), path.display()),
            ),
            Err(e) => self.notify(Severity::Error, "Download failed", e.to_string()),
        }
    }

    fn set_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
        self.detail_scroll = 0;
    }

    /// Moves the selection by `delta` rows; down is older
    fn move_selection(&mut self, delta: isize) {
        if self.store.is_empty() {
            return;
        }
        let index = match self.store.selected_position() {
            Some(current) => current.saturating_add_signed(delta),
            None => 0,
        };
        self.select_index(index.min(self.store.len() - 1));
    }

    fn select_index(&mut self, index: usize) {
        let Some(id) = self.store.at(index).map(|r| r.id.clone()) else {
            return;
        };
        if self.store.selected_position() != Some(index) {
            self.detail_scroll = 0;
        }
        self.store.select(&id);
    }
}
