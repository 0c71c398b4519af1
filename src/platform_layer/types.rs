/*
 * This module defines the data types used for communication between the
 * application logic and the platform layer: platform-agnostic user events
 * (`AppEvent`), commands for the platform layer (`PlatformCommand`), the tree
 * item descriptors the platform renders, severity levels for status messages
 * (`MessageSeverity`), and the `PlatformEventHandler` trait that the application
 * logic must implement.
 */

use crate::core::{Theme, TopTokenFile};
use std::path::PathBuf;

// Represents the visual check state of an item, typically a checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

// Describes a single item to be displayed in a tree-like control.
//
// Items are identified by their slash-separated repository path, which is unique
// within a snapshot. Folder paths have no trailing slash.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItemDescriptor {
    pub path: String,
    pub text: String,
    pub is_folder: bool,
    pub state: CheckState,
    pub token_label: String,
    pub size_label: Option<String>,
    pub expanded: bool,
    pub children: Vec<TreeItemDescriptor>,
}

// --- Events from Platform to App Logic ---

/*
 * Represents platform-agnostic user events. The console platform translates
 * typed commands into these; a graphical front-end would translate clicks.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    LoadFromReference(String),
    LoadFromArchiveFile(PathBuf),
    // A checkbox click on a file or folder.
    ToggleSelection(String),
    SetSelection { path: String, selected: bool },
    SelectAll,
    DeselectAll,
    InvertSelection,
    ToggleFolderExpanded(String),
    SetFolderExpanded { path: String, expanded: bool },
    // An empty text clears the filter.
    FilterTextSubmitted(String),
    OpenFileViewer(String),
    GenerateDocument,
    CopyToClipboard,
    // `None` saves under the default file name.
    SaveDocument(Option<PathBuf>),
    SetTheme(Theme),
    ToggleTheme,
    ToggleTopFilesPanel,
    ShowTree,
    QuitRequested,
}

// Defines the severity of a status message.
// Ordered from least to most severe for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

// Represents platform-agnostic commands sent from the application logic to the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCommand {
    UpdateStatus {
        message: String,
        // 0..=100, or `None` to leave the progress indicator as it is.
        percent: Option<u8>,
        severity: MessageSeverity,
    },
    PopulateTreeView {
        items: Vec<TreeItemDescriptor>,
        selected_tokens: usize,
        total_tokens: usize,
        approximate: bool,
    },
    ShowTopTokenFiles {
        entries: Vec<TopTokenFile>,
        collapsed: bool,
    },
    ShowDocument {
        text: String,
        token_count: usize,
        file_count: usize,
        approximate: bool,
    },
    ShowFileContent {
        path: String,
        language: String,
        content: String,
    },
    CopyTextToClipboard {
        text: String,
    },
    WriteDocumentFile {
        path: PathBuf,
        text: String,
    },
    ApplyTheme(Theme),
    QuitApplication,
}

// --- Trait for App Logic to Handle Events ---

// A trait to be implemented by the application logic layer to handle UI events.
pub trait PlatformEventHandler: Send + Sync + 'static {
    // Handles one event and enqueues the resulting `PlatformCommand`s.
    fn handle_event(&mut self, event: AppEvent);

    // Called by the platform layer when the application is about to exit its loop.
    fn on_quit(&mut self) {}

    // Attempts to dequeue a single `PlatformCommand` from the internal queue.
    fn try_dequeue_command(&mut self) -> Option<PlatformCommand>;
}
