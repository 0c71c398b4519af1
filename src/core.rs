/*
 * This module consolidates the core, platform-agnostic logic of the application:
 * where archives come from, how they are ingested into repository files, how
 * selections and token counts are tracked for a session, and how the final prompt
 * document is generated. It re-exports the abstractions (`ArchiveSourceOperations`,
 * `ArchiveIngesterOperations`, `TokenCounterOperations`,
 * `PreferencesManagerOperations`) and their core implementations.
 */
pub mod archive_ingester;
pub mod archive_source;
pub mod checksum_utils;
pub mod document_generator;
pub mod path_classifier;
pub mod path_utils;
pub mod preferences;
pub mod repo_file;
pub mod selection_tree;
pub mod session;
pub mod tokenizer_utils;

pub use archive_ingester::{ArchiveIngesterOperations, CoreZipIngester, IngestOptions};
pub use archive_source::{ArchiveSourceOperations, CoreArchiveSource, DownloadProgress, RepoReference};
pub use document_generator::TopTokenFile;
pub use preferences::{CorePreferencesManager, Preferences, PreferencesManagerOperations, Theme};
pub use repo_file::RepoFile;
pub use selection_tree::{FolderNode, SelectionState, SelectionTree, TreeNode};
pub use session::SessionContext;
pub use tokenizer_utils::{CoreTikTokenCounter, TokenAccountant, TokenCounterOperations};

#[cfg(test)]
pub use archive_source::SourceError;
#[cfg(test)]
pub use preferences::PreferencesError;
