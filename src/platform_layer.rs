pub mod app;
pub mod clipboard;
pub(crate) mod command_executor;
pub mod console;
pub mod error;
pub mod types;

pub use app::PlatformInterface;
pub use clipboard::CoreClipboard;
pub use command_executor::ConsoleExecutor;
pub use error::{PlatformError, Result as PlatformResult};
pub use types::{
    AppEvent, CheckState, MessageSeverity, PlatformCommand, PlatformEventHandler,
    TreeItemDescriptor,
};
