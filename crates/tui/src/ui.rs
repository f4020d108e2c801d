//! UI rendering functions
//!
//! This module contains all the Ratatui rendering logic for the TUI.

use chrono::{Local, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use capture::CapturedRequest;

use crate::app::{App, DetailTab, InputMode, Severity};
use crate::format::{age_since, truncate};
use crate::json_view::json_lines;

/// Primary colors for the UI
const ACCENT_COLOR: Color = Color::Cyan;
const SUCCESS_COLOR: Color = Color::Green;
const ERROR_COLOR: Color = Color::Red;
const WARNING_COLOR: Color = Color::Yellow;
const MUTED_COLOR: Color = Color::DarkGray;

const EMPTY_LIST: &str =
    "No requests received yet. Send a request to your webhook URL to get started.";
const EMPTY_DETAILS: &str = "Select a request to view its details";

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    // Main layout: Header, Content, Notifications, Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header with status
            Constraint::Min(8),    // Requests and details
            Constraint::Length(7), // Notifications
            Constraint::Length(3), // Help footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    render_request_list(frame, app, content[0]);
    render_details(frame, app, content[1]);

    render_notifications(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    // Render overlays
    if app.input_mode == InputMode::Help {
        render_help_overlay(frame);
    }

    if let InputMode::UrlInput(ref current) = app.input_mode {
        render_url_input(frame, current);
    }
}

/// Render the header with listening status
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status_text, status_color) = if app.session.is_listening() {
        ("● Listening", SUCCESS_COLOR)
    } else {
        ("● Not Listening", MUTED_COLOR)
    };

    let url = app.session.url();
    let url_span = if url.is_empty() {
        Span::styled("Not Set", Style::default().fg(WARNING_COLOR))
    } else {
        Span::styled(url.to_string(), Style::default().fg(Color::White))
    };

    let header_text = vec![
        Line::from(vec![
            Span::raw("  Status: "),
            Span::styled(status_text, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![Span::raw("  URL: "), url_span]),
        Line::from(vec![
            Span::raw("  Mode: "),
            Span::styled(app.session.mode().to_string(), Style::default().fg(ACCENT_COLOR)),
            Span::styled(" | Requests: ", Style::default().fg(MUTED_COLOR)),
            Span::styled(app.store.len().to_string(), Style::default().fg(Color::White)),
        ]),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .title(format!(" hookwatch v{} ", env!("CARGO_PKG_VERSION")))
            .title_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(ACCENT_COLOR)),
    );

    frame.render_widget(header, area);
}

fn method_color(method: &str) -> Color {
    match method {
        "GET" => SUCCESS_COLOR,
        "POST" => ACCENT_COLOR,
        "PUT" | "PATCH" => WARNING_COLOR,
        "DELETE" => ERROR_COLOR,
        _ => Color::Magenta,
    }
}

/// Render the captured request list, newest first
fn render_request_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Requests ({}) ", app.store.len()))
        .title_style(Style::default().fg(Color::White))
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(MUTED_COLOR));

    if app.store.is_empty() {
        let empty = Paragraph::new(EMPTY_LIST)
            .style(Style::default().fg(MUTED_COLOR))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let now = Utc::now();
    let path_width = area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = app
        .store
        .records()
        .map(|request| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        format!(" {:<7}", request.method),
                        Style::default()
                            .fg(method_color(&request.method))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(age_since(request.timestamp, now), Style::default().fg(MUTED_COLOR)),
                ]),
                Line::from(Span::styled(
                    format!("   {}", truncate(&request.path, path_width)),
                    Style::default().fg(Color::White),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Indexed(236)).add_modifier(Modifier::BOLD))
        .highlight_symbol("▌");

    let mut state = ListState::default().with_selected(app.store.selected_position());
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the detail pane for the selected request
fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(Style::default().fg(Color::White))
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(MUTED_COLOR));

    let Some(request) = app.store.selected() else {
        let empty = Paragraph::new(EMPTY_DETAILS)
            .style(Style::default().fg(MUTED_COLOR))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Label and timestamp
            Constraint::Length(2), // Tabs
            Constraint::Min(1),    // Content
        ])
        .split(inner);

    let timestamp = request
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let summary = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", request.method),
                Style::default()
                    .fg(method_color(&request.method))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(request.path.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(format!(" {}", timestamp), Style::default().fg(MUTED_COLOR))),
    ]);
    frame.render_widget(summary, chunks[0]);

    let tabs = Tabs::new(DetailTab::all().iter().map(|tab| tab.title()))
        .select(app.tab.index())
        .style(Style::default().fg(MUTED_COLOR))
        .highlight_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(MUTED_COLOR)));
    frame.render_widget(tabs, chunks[1]);

    let content = Paragraph::new(json_lines(&tab_value(request, app.tab))).scroll((app.detail_scroll, 0));
    frame.render_widget(content, chunks[2]);
}

fn tab_value(request: &CapturedRequest, tab: DetailTab) -> serde_json::Value {
    match tab {
        DetailTab::Body => request.body.clone(),
        DetailTab::Headers => request.headers_value(),
        DetailTab::Query => request.query_params_value(),
    }
}

/// Render the notification history with colored levels
fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    // Width left after borders, timestamp and icon
    let max_msg_width = area.width.saturating_sub(16) as usize;

    let lines: Vec<Line> = app
        .notifications
        .iter()
        .skip(app.notification_scroll)
        .take(visible_height)
        .map(|entry| {
            let (icon, color) = match entry.level {
                Severity::Info => ("•", MUTED_COLOR),
                Severity::Success => ("✓", SUCCESS_COLOR),
                Severity::Warning => ("⚠", WARNING_COLOR),
                Severity::Error => ("✗", ERROR_COLOR),
            };
            let message = format!("{}: {}", entry.title, entry.description);

            Line::from(vec![
                Span::styled(format!(" [{}] ", entry.timestamp), Style::default().fg(MUTED_COLOR)),
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(truncate(&message, max_msg_width), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let notifications = Paragraph::new(lines).block(
        Block::default()
            .title(" Activity ")
            .title_style(Style::default().fg(Color::White))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(MUTED_COLOR)),
    );

    frame.render_widget(notifications, area);
}

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
}

/// Render the help footer
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.input_mode {
        InputMode::Normal => {
            let listen_action = if app.session.is_listening() { "top " } else { "tart " };
            Line::from(vec![
                key(" [S]"),
                Span::raw(listen_action),
                key("[E]"),
                Span::raw("dit URL "),
                key("[C]"),
                Span::raw("opy URL "),
                key("[Y]"),
                Span::raw("ank "),
                key("[X]"),
                Span::raw(" Clear "),
                key("[D]"),
                Span::raw("ownload "),
                key("[Tab]"),
                Span::raw(" View "),
                key("[H]"),
                Span::raw("elp "),
                key("[Q]"),
                Span::raw("uit"),
            ])
        }
        InputMode::UrlInput(_) => Line::from(vec![
            Span::styled(" Enter webhook URL, ", Style::default().fg(WARNING_COLOR)),
            key("[Enter]"),
            Span::raw(" save and fetch, "),
            key("[Esc]"),
            Span::raw(" cancel"),
        ]),
        InputMode::Help => Line::from(vec![Span::styled(
            " Press any key to close help",
            Style::default().fg(MUTED_COLOR),
        )]),
    };

    let footer = Paragraph::new(help_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(MUTED_COLOR)),
    );

    frame.render_widget(footer, area);
}

fn help_line(keys: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<9}", keys), Style::default().fg(ACCENT_COLOR)),
        Span::raw(description),
    ])
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 80, frame.area());

    // Clear the background
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Keybindings",
            Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        help_line("S", "Start/Stop listening"),
        help_line("E", "Edit URL (Enter fetches once)"),
        help_line("R", "Fetch the URL once"),
        help_line("C", "Copy URL to clipboard"),
        help_line("Y", "Copy selected request as JSON"),
        help_line("X", "Clear all requests"),
        help_line("D", "Download requests as JSON"),
        Line::from(""),
        help_line("↑/k ↓/j", "Select newer/older request"),
        help_line("g/G", "Jump to newest/oldest"),
        help_line("Tab 1-3", "Body, Headers, Query Params"),
        help_line("PgUp/Dn", "Scroll details"),
        Line::from(""),
        help_line("H/?", "Show this help"),
        help_line("Q/Esc", "Quit application"),
        Line::from(""),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_set(border::DOUBLE)
                .border_style(Style::default().fg(ACCENT_COLOR)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, area);
}

/// Render URL input overlay
fn render_url_input(frame: &mut Frame, current: &str) {
    let area = centered_rect(70, 20, frame.area());

    frame.render_widget(Clear, area);

    let input_text = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  URL: "),
            Span::styled(current, Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)),
            Span::styled("_", Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
    ];

    let input = Paragraph::new(input_text).block(
        Block::default()
            .title(" Webhook URL ")
            .title_style(Style::default().fg(WARNING_COLOR))
            .borders(Borders::ALL)
            .border_set(border::DOUBLE)
            .border_style(Style::default().fg(WARNING_COLOR)),
    );

    frame.render_widget(input, area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
