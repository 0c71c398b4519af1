/*
 * Shared constants of the application logic layer.
 */

// Application name used for the per-user configuration directory.
pub const APP_NAME: &str = "PromptPackerApp";

// File name the generated document is saved under when no path is given.
pub const DEFAULT_DOCUMENT_FILENAME: &str = "prompt_packer.txt";

pub const LOG_FILENAME: &str = "prompt_packer.log";

// Length of the "top files by tokens" panel.
pub const TOP_FILES_LIMIT: usize = 10;

// Load progress milestones, in percent.
pub const PROGRESS_INGEST_START: u8 = 10;
pub const PROGRESS_INGEST_END: u8 = 90;
pub const PROGRESS_TREE_BUILT: u8 = 90;
pub const PROGRESS_VIEW_POPULATED: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;
