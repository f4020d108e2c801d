//! hookwatch - terminal webhook inspector
//!
//! This is the main entry point for the TUI application.
//! It loads the configuration, initializes the terminal, sets up the
//! event loop, and runs the app.

mod app;
mod event;
mod format;
mod json_view;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use common::config::{CaptureMode, Config};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use event::EventSource;
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect webhook payloads from the terminal")]
struct Args {
    /// Path to a config file (defaults to the platform config directory)
    #[arg(long, env = "HOOKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Webhook URL to watch
    #[arg(long, env = "HOOKWATCH_URL")]
    url: Option<String>,

    /// Capture strategy: fetch, poll, push or fixture
    #[arg(long)]
    mode: Option<CaptureMode>,

    /// Seconds between polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// CORS relay template; `{url}` is replaced by the target URL
    #[arg(long)]
    relay: Option<String>,

    /// Directory for exported requests
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log file (the terminal is taken by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(url) = &self.url {
            config.capture.url = url.trim().to_string();
        }
        if let Some(mode) = self.mode {
            config.capture.mode = mode;
        }
        if let Some(secs) = self.poll_interval {
            config.capture.poll_interval_secs = secs;
        }
        if let Some(relay) = &self.relay {
            config.capture.relay_url = Some(relay.clone());
        }
        if let Some(dir) = &self.export_dir {
            config.export.directory = Some(dir.clone());
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    // Initialize logging to file (not stdout, since we're using the terminal)
    let log_path = config.logging.file();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    info!("hookwatch starting in {} mode", config.capture.mode);

    let (mut app, captures) = App::new(&config)?;
    let mut events = EventSource::new(captures, Duration::from_millis(250));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal, &mut events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[capture]\nmode = \"push\"\nurl = \"https://a.example\"\npoll_interval_secs = 9\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "hookwatch",
            "--config",
            path.to_str().unwrap(),
            "--url",
            " https://b.example/hook ",
            "--poll-interval",
            "2",
        ]);
        let config = args.load_config().unwrap();
        assert_eq!(config.capture.mode, CaptureMode::Push);
        assert_eq!(config.capture.url, "https://b.example/hook");
        assert_eq!(config.capture.poll_interval_secs, 2);
    }

    #[test]
    fn test_mode_flag_parses() {
        let args = Args::parse_from(["hookwatch", "--mode", "fixture"]);
        assert_eq!(args.mode, Some(CaptureMode::Fixture));
        assert!(Args::try_parse_from(["hookwatch", "--mode", "carrier-pigeon"]).is_err());
    }
}
