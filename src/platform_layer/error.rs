use super::clipboard::ClipboardError;
use std::io;

// Represents errors that can occur while the console platform executes commands.
#[derive(Debug)]
pub enum PlatformError {
    /// Writing to the console or to a document file failed.
    Io(io::Error),
    /// Neither the system clipboard nor the terminal fallback accepted the text.
    Clipboard(ClipboardError),
    /// A line typed by the user could not be turned into an event.
    InvalidInput(String),
    /// A requested operation could not be completed.
    OperationFailed(String),
}

impl From<io::Error> for PlatformError {
    fn from(err: io::Error) -> Self {
        PlatformError::Io(err)
    }
}

impl From<ClipboardError> for PlatformError {
    fn from(err: ClipboardError) -> Self {
        PlatformError::Clipboard(err)
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::Io(e) => write!(f, "I/O Error: {}", e),
            PlatformError::Clipboard(e) => write!(f, "Clipboard Error: {}", e),
            PlatformError::InvalidInput(s) => write!(f, "{}", s),
            PlatformError::OperationFailed(s) => write!(f, "Operation Failed: {}", s),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Io(e) => Some(e),
            PlatformError::Clipboard(e) => Some(e),
            PlatformError::InvalidInput(_) | PlatformError::OperationFailed(_) => None,
        }
    }
}

/// A specialized `Result` type for platform layer operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
