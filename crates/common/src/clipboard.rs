//! System clipboard access through the platform's clipboard commands
//!
//! Shelling out is more reliable than a native binding on Linux, where
//! the clipboard owner has to outlive the process.

use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard command worked (tried {tried})")]
    Unavailable { tried: String },
}

/// A clipboard command that reads the text to copy from stdin
struct ClipboardCommand {
    program: &'static str,
    args: &'static [&'static str],
}

#[cfg(target_os = "linux")]
const COMMANDS: &[ClipboardCommand] = &[
    ClipboardCommand { program: "wl-copy", args: &[] },
    ClipboardCommand { program: "xclip", args: &["-selection", "clipboard"] },
    ClipboardCommand { program: "xsel", args: &["--clipboard", "--input"] },
];

#[cfg(target_os = "macos")]
const COMMANDS: &[ClipboardCommand] = &[ClipboardCommand { program: "pbcopy", args: &[] }];

#[cfg(target_os = "windows")]
const COMMANDS: &[ClipboardCommand] = &[ClipboardCommand {
    program: "powershell",
    args: &["-NoProfile", "-Command", "$input | Set-Clipboard"],
}];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const COMMANDS: &[ClipboardCommand] = &[];

/// Copies `text` to the system clipboard.
/// Returns the name of the command that succeeded.
pub fn copy(text: &str) -> Result<&'static str, ClipboardError> {
    for command in COMMANDS {
        match pipe_to(command, text) {
            Ok(true) => return Ok(command.program),
            Ok(false) => debug!("{} exited unsuccessfully", command.program),
            Err(e) => debug!("{} unavailable: {}", command.program, e),
        }
    }

    Err(ClipboardError::Unavailable {
        tried: command_names().join(", "),
    })
}

/// Names of the clipboard commands tried on this platform, in order
pub fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|c| c.program).collect()
}

fn pipe_to(command: &ClipboardCommand, text: &str) -> std::io::Result<bool> {
    let mut child = Command::new(command.program)
        .args(command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    Ok(child.wait()?.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_supported_platforms_have_commands() {
        assert!(!command_names().is_empty());
    }

    #[test]
    fn test_unavailable_error_lists_commands() {
        let err = ClipboardError::Unavailable {
            tried: "xclip, xsel".to_string(),
        };
        assert_eq!(err.to_string(), "no clipboard command worked (tried xclip, xsel)");
    }
}
