/*
 * Clipboard access for the console platform. The system clipboard (via `arboard`)
 * is tried first. On headless machines or over SSH that usually fails, so the text
 * is then handed to the terminal emulator with an OSC 52 escape sequence, which
 * most modern terminals turn into a clipboard write on the user's side.
 */
use base64::Engine;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOutcome {
    Copied,
    CopiedViaTerminal,
}

#[derive(Debug)]
pub enum ClipboardError {
    Unavailable(String),
    Terminal(io::Error),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::Unavailable(s) => write!(f, "Clipboard unavailable: {s}"),
            ClipboardError::Terminal(e) => write!(f, "Terminal clipboard write failed: {e}"),
        }
    }
}

impl std::error::Error for ClipboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClipboardError::Terminal(e) => Some(e),
            ClipboardError::Unavailable(_) => None,
        }
    }
}

pub trait ClipboardOperations: Send + Sync {
    fn copy_text(&self, text: &str) -> Result<ClipboardOutcome, ClipboardError>;
}

/* The OSC 52 "set clipboard" sequence for `text`. */
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

pub struct CoreClipboard {
    terminal_fallback: bool,
}

impl CoreClipboard {
    pub fn new() -> Self {
        CoreClipboard {
            terminal_fallback: true,
        }
    }

    // Only the system clipboard; used when stdout is not a terminal.
    pub fn without_terminal_fallback() -> Self {
        CoreClipboard {
            terminal_fallback: false,
        }
    }

    fn copy_via_terminal(text: &str) -> Result<ClipboardOutcome, ClipboardError> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(ClipboardError::Terminal)?;
        Ok(ClipboardOutcome::CopiedViaTerminal)
    }
}

impl Default for CoreClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardOperations for CoreClipboard {
    fn copy_text(&self, text: &str) -> Result<ClipboardOutcome, ClipboardError> {
        let system_result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match system_result {
            Ok(()) => {
                log::debug!("Clipboard: Copied {} bytes to the system clipboard.", text.len());
                Ok(ClipboardOutcome::Copied)
            }
            Err(e) if self.terminal_fallback => {
                log::info!("Clipboard: System clipboard failed ({e}), trying OSC 52.");
                Self::copy_via_terminal(text)
            }
            Err(e) => Err(ClipboardError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence_encodes_text() {
        assert_eq!(osc52_sequence("hello"), "\x1b]52;c;aGVsbG8=\x07");
        assert_eq!(osc52_sequence(""), "\x1b]52;c;\x07");
    }

    #[test]
    fn test_osc52_sequence_handles_unicode() {
        let seq = osc52_sequence("├── é");
        let encoded = seq
            .strip_prefix("\x1b]52;c;")
            .and_then(|s| s.strip_suffix('\x07'))
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "├── é");
    }
}
