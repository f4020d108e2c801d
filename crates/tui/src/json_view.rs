//! Read-only, syntax-highlighted JSON tree for the detail pane

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use serde_json::Value;

const KEY_COLOR: Color = Color::Cyan;
const STRING_COLOR: Color = Color::Green;
const NUMBER_COLOR: Color = Color::Yellow;
const BOOL_COLOR: Color = Color::Magenta;
const NULL_COLOR: Color = Color::DarkGray;
const PUNCT_COLOR: Color = Color::White;

const INDENT: &str = "  ";

/// Renders `value` as pretty-printed JSON lines, two-space indent
pub fn json_lines(value: &Value) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    push_value(&mut lines, Vec::new(), value, 0, false);
    lines
}

fn push_value(
    lines: &mut Vec<Line<'static>>,
    mut prefix: Vec<Span<'static>>,
    value: &Value,
    depth: usize,
    comma: bool,
) {
    let indent = INDENT.repeat(depth);
    let trailer = if comma { "," } else { "" };

    let (open, close, children): (&str, &str, Vec<(Option<&String>, &Value)>) = match value {
        Value::Object(map) if !map.is_empty() => {
            ("{", "}", map.iter().map(|(k, v)| (Some(k), v)).collect())
        }
        Value::Array(items) if !items.is_empty() => {
            ("[", "]", items.iter().map(|v| (None, v)).collect())
        }
        scalar => {
            let mut spans = vec![Span::raw(indent)];
            spans.append(&mut prefix);
            spans.push(scalar_span(scalar));
            spans.push(punct(trailer));
            lines.push(Line::from(spans));
            return;
        }
    };

    let mut spans = vec![Span::raw(indent.clone())];
    spans.append(&mut prefix);
    spans.push(punct(open));
    lines.push(Line::from(spans));

    let last = children.len() - 1;
    for (i, (key, child)) in children.into_iter().enumerate() {
        let child_prefix = match key {
            Some(key) => vec![
                Span::styled(Value::String(key.clone()).to_string(), Style::default().fg(KEY_COLOR)),
                punct(": "),
            ],
            None => Vec::new(),
        };
        push_value(lines, child_prefix, child, depth + 1, i < last);
    }

    lines.push(Line::from(vec![
        Span::raw(indent),
        punct(close),
        punct(trailer),
    ]));
}

fn scalar_span(value: &Value) -> Span<'static> {
    let color = match value {
        Value::String(_) => STRING_COLOR,
        Value::Number(_) => NUMBER_COLOR,
        Value::Bool(_) => BOOL_COLOR,
        Value::Null => NULL_COLOR,
        // Only empty containers reach here
        Value::Object(_) | Value::Array(_) => PUNCT_COLOR,
    };
    Span::styled(value.to_string(), Style::default().fg(color))
}

fn punct(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(PUNCT_COLOR))
}
